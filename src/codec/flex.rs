//! # Flexible Codecs
//!
//! Codecs whose payload length is declared per field in the schema. The
//! declared number is an element count; the stored payload length is
//! `element_count * elem_size`. Encoding truncates or zero-pads the natural
//! encoding to exactly the declared length, always on an element boundary.
//!
//! String decoders trim trailing zero elements, so a value shorter than its
//! field reads back as written. The raw-bytes codec performs no trimming:
//! a bytes field always reads back at its full declared length.

use super::{Codec, CodecKind};
use crate::error::{Error, Result};
use crate::types::Value;

/// UTF-16 string, two bytes per element, normalized to little-endian on disk.
#[derive(Debug)]
pub struct Utf16Codec;

impl Codec for Utf16Codec {
    fn name(&self) -> &'static str {
        "utf16"
    }

    fn kind(&self) -> CodecKind {
        CodecKind::Flexible { elem_size: 2 }
    }

    fn endian_sensitive(&self) -> bool {
        true
    }

    fn encode_flex(&self, value: &Value, payload_len: usize) -> Result<Vec<u8>> {
        let s = match value {
            Value::Utf16(s) => s,
            other => {
                return Err(Error::ValueMismatch {
                    codec: self.name(),
                    expected: "utf16",
                    got: other.kind_name(),
                })
            }
        };
        let mut buf = vec![0u8; payload_len];
        for (i, unit) in s.encode_utf16().take(payload_len / 2).enumerate() {
            buf[i * 2..i * 2 + 2].copy_from_slice(&unit.to_ne_bytes());
        }
        Ok(buf)
    }

    fn decode_flex(&self, bytes: &[u8], payload_len: usize) -> Result<Value> {
        debug_assert_eq!(bytes.len(), payload_len);
        let mut units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
            .collect();
        while units.last() == Some(&0) {
            units.pop();
        }
        Ok(Value::Utf16(String::from_utf16_lossy(&units)))
    }
}

/// ASCII string, one byte per element. Rejects non-ASCII input rather than
/// silently mangling it.
#[derive(Debug)]
pub struct AsciiCodec;

impl Codec for AsciiCodec {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn kind(&self) -> CodecKind {
        CodecKind::Flexible { elem_size: 1 }
    }

    fn encode_flex(&self, value: &Value, payload_len: usize) -> Result<Vec<u8>> {
        let s = match value {
            Value::Ascii(s) if s.is_ascii() => s,
            Value::Ascii(_) => {
                return Err(Error::ValueMismatch {
                    codec: self.name(),
                    expected: "ascii string",
                    got: "non-ascii string",
                })
            }
            other => {
                return Err(Error::ValueMismatch {
                    codec: self.name(),
                    expected: "ascii",
                    got: other.kind_name(),
                })
            }
        };
        let mut buf = vec![0u8; payload_len];
        let n = s.len().min(payload_len);
        buf[..n].copy_from_slice(&s.as_bytes()[..n]);
        Ok(buf)
    }

    fn decode_flex(&self, bytes: &[u8], payload_len: usize) -> Result<Value> {
        debug_assert_eq!(bytes.len(), payload_len);
        let end = bytes
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |pos| pos + 1);
        Ok(Value::Ascii(
            String::from_utf8_lossy(&bytes[..end]).into_owned(),
        ))
    }
}

/// Raw byte buffer, stored verbatim with zero padding and no endian handling.
#[derive(Debug)]
pub struct BytesCodec;

impl Codec for BytesCodec {
    fn name(&self) -> &'static str {
        "bytes"
    }

    fn kind(&self) -> CodecKind {
        CodecKind::Flexible { elem_size: 1 }
    }

    fn encode_flex(&self, value: &Value, payload_len: usize) -> Result<Vec<u8>> {
        let data = match value {
            Value::Bytes(data) => data,
            other => {
                return Err(Error::ValueMismatch {
                    codec: self.name(),
                    expected: "bytes",
                    got: other.kind_name(),
                })
            }
        };
        let mut buf = vec![0u8; payload_len];
        let n = data.len().min(payload_len);
        buf[..n].copy_from_slice(&data[..n]);
        Ok(buf)
    }

    fn decode_flex(&self, bytes: &[u8], payload_len: usize) -> Result<Value> {
        debug_assert_eq!(bytes.len(), payload_len);
        Ok(Value::Bytes(bytes.to_vec()))
    }
}
