//! # Scan Projection
//!
//! Resolves requested field names once, up front, into `(offset, length,
//! codec)` entries so the per-slot loop does no name lookups. Offsets count
//! from the start of the slot, so the options byte at offset 0 is skipped by
//! construction.

use crate::codec::{decode_payload, endian, Codec};
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::{Record, Row, Value};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub(crate) struct ProjField {
    offset: usize,
    length: usize,
    elem_width: usize,
    endian: bool,
    codec: Arc<dyn Codec>,
}

impl ProjField {
    fn decode(&self, slot: &[u8]) -> Result<Value> {
        let raw = &slot[self.offset..self.offset + self.length];
        let bytes = if self.endian {
            endian::from_disk(raw, self.elem_width)
        } else {
            Cow::Borrowed(raw)
        };
        decode_payload(self.codec.as_ref(), &bytes, self.length)
    }
}

/// Precomputed field extraction table for one scan.
#[derive(Debug, Clone)]
pub(crate) struct Projection {
    fields: SmallVec<[ProjField; 8]>,
}

impl Projection {
    /// Resolves the requested names against the schema, in request order.
    pub fn resolve(schema: &Schema, names: &[&str]) -> Result<Self> {
        let fields = names
            .iter()
            .map(|name| {
                let index = schema
                    .field_index(name)
                    .ok_or_else(|| Error::UnknownField((*name).to_string()))?;
                Ok(Self::entry(schema, index))
            })
            .collect::<Result<SmallVec<_>>>()?;
        Ok(Self { fields })
    }

    /// Projection over every field, in on-disk order.
    pub fn full(schema: &Schema) -> Self {
        Self {
            fields: (0..schema.fields().len())
                .map(|index| Self::entry(schema, index))
                .collect(),
        }
    }

    fn entry(schema: &Schema, index: usize) -> ProjField {
        let field = &schema.fields()[index];
        ProjField {
            offset: schema.payload_offset(index),
            length: field.length(),
            elem_width: field.codec().kind().elem_width(),
            endian: field.codec().endian_sensitive(),
            codec: Arc::clone(field.codec()),
        }
    }

    pub fn decode_row(&self, id: u64, slot: &[u8]) -> Result<Row> {
        let mut row = Row::new(id);
        row.values.reserve(self.fields.len());
        for field in &self.fields {
            row.values.push(field.decode(slot)?);
        }
        Ok(row)
    }

    pub fn decode_record(&self, id: u64, slot: &[u8]) -> Result<Record> {
        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            values.push(field.decode(slot)?);
        }
        Ok(Record { id, values })
    }
}
