//! # File Header Encoding
//!
//! The header leads every record file and describes the schema the slots are
//! laid out against:
//!
//! ```text
//! off 0x00  u16_le  field_count - 1
//! off 0x02  field_header[0]
//!           ...
//!
//! field_header := u8 (name_len - 1) || name bytes (ASCII) || u16_le (payload_len - 1)
//! ```
//!
//! Counts and lengths are stored minus one so the full integer range is
//! usable and zero-length entries are unrepresentable. Multi-byte integers
//! use the little-endian `zerocopy` wrappers.

use crate::error::{Error, Result};
use crate::schema::FieldDef;
use std::io::Read;
use zerocopy::little_endian::U16;
use zerocopy::{FromBytes, IntoBytes};

/// A field as parsed back from a file header: just the wire identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskField {
    pub name: String,
    pub length: usize,
}

/// Encodes the header for an ordered field list.
pub fn encode(fields: &[FieldDef]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(
        2 + fields.iter().map(|f| 3 + f.name().len()).sum::<usize>(),
    );
    buf.extend_from_slice(U16::new((fields.len() - 1) as u16).as_bytes());
    for field in fields {
        buf.push((field.name().len() - 1) as u8);
        buf.extend_from_slice(field.name().as_bytes());
        buf.extend_from_slice(U16::new((field.length() - 1) as u16).as_bytes());
    }
    buf
}

/// Parses a header from the start of a record file.
///
/// A short read is reported as [`Error::Corruption`]; every other I/O
/// failure passes through as [`Error::Io`].
pub fn parse(reader: &mut impl Read) -> Result<Vec<DiskField>> {
    let field_count = read_u16(reader)? as usize + 1;

    let mut fields = Vec::with_capacity(field_count);
    for _ in 0..field_count {
        let name_len = read_exact::<1>(reader)?[0] as usize + 1;
        let mut name_bytes = vec![0u8; name_len];
        fill(reader, &mut name_bytes)?;
        if !name_bytes.is_ascii() {
            return Err(Error::Corruption(
                "field name in header is not ASCII".into(),
            ));
        }
        let name = String::from_utf8(name_bytes)
            .map_err(|_| Error::Corruption("field name in header is not ASCII".into()))?;
        let length = read_u16(reader)? as usize + 1;
        fields.push(DiskField { name, length });
    }
    Ok(fields)
}

/// Header byte length for a parsed field list.
pub fn size_of(fields: &[DiskField]) -> usize {
    2 + fields.iter().map(|f| 3 + f.name.len()).sum::<usize>()
}

fn read_u16(reader: &mut impl Read) -> Result<u16> {
    let bytes = read_exact::<2>(reader)?;
    // Infallible on a 2-byte input.
    Ok(U16::read_from_bytes(&bytes).map(U16::get).unwrap_or(0))
}

fn read_exact<const N: usize>(reader: &mut impl Read) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    fill(reader, &mut buf)?;
    Ok(buf)
}

fn fill(reader: &mut impl Read, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Corruption("truncated file header".into())
        } else {
            Error::Io(e)
        }
    })
}
