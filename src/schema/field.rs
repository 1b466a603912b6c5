//! # Field Definitions and the Schema Builder
//!
//! [`FieldDef`] is one column of a record type: an ASCII name, a payload byte
//! length, and the codec that fills it. Equality deliberately ignores the
//! codec and compares `(name, length)` only, so a codec can be swapped for
//! another of identical wire length without a header rewrite.
//!
//! [`SchemaBuilder`] collects field declarations and validates the whole
//! schema once in [`SchemaBuilder::build`]: names must be non-empty ASCII of
//! at most 256 bytes and unique, payload lengths must fall in 1..=65536, the
//! field count in 1..=65536, and every declaration must match its codec's
//! kind (fixed fields carry the codec's byte count, flexible fields declare
//! an element count).

use crate::codec::{validate_codec, Codec, CodecKind, CodecRegistry, FieldKind};
use crate::config::{
    FIELD_COUNT_SIZE, FIELD_HEADER_OVERHEAD, MAX_FIELD_COUNT, MAX_NAME_LEN, MAX_PAYLOAD_LEN,
    OPTIONS_SIZE,
};
use crate::error::{Error, Result};
use std::sync::Arc;

/// One column of a record type.
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    length: usize,
    codec: Arc<dyn Codec>,
}

impl FieldDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payload byte length inside a slot.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }
}

impl PartialEq for FieldDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.length == other.length
    }
}

impl Eq for FieldDef {}

/// Validated, immutable schema of one record type.
#[derive(Debug, Clone)]
pub struct Schema {
    type_name: String,
    fields: Vec<FieldDef>,
    header_size: usize,
    slot_size: usize,
}

impl Schema {
    pub fn builder(type_name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(type_name)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Byte length of the file header encoding this schema.
    pub fn header_size(&self) -> usize {
        self.header_size
    }

    /// Byte length of one slot: the options byte plus every payload.
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Byte offset of a field's payload inside a slot, counting the options
    /// byte.
    pub fn payload_offset(&self, field_index: usize) -> usize {
        OPTIONS_SIZE
            + self.fields[..field_index]
                .iter()
                .map(|f| f.length)
                .sum::<usize>()
    }

    /// Reorders the fields to the order found on disk. The disk list must be
    /// set-equal to this schema by `(name, length)`; anything else is a
    /// header mismatch.
    pub(crate) fn reorder_to(&self, disk_fields: &[(String, usize)]) -> Result<Schema> {
        if disk_fields.len() != self.fields.len() {
            return Err(Error::HeaderMismatch(format!(
                "file header has {} fields, schema declares {}",
                disk_fields.len(),
                self.fields.len()
            )));
        }

        let mut reordered = Vec::with_capacity(self.fields.len());
        for (name, length) in disk_fields {
            let field = self
                .fields
                .iter()
                .find(|f| &f.name == name && f.length == *length)
                .ok_or_else(|| {
                    Error::HeaderMismatch(format!(
                        "file header field '{name}' ({length} bytes) is not in the schema"
                    ))
                })?;
            reordered.push(field.clone());
        }

        Ok(Schema {
            type_name: self.type_name.clone(),
            fields: reordered,
            header_size: self.header_size,
            slot_size: self.slot_size,
        })
    }
}

enum PendingLength {
    /// Payload length comes from the codec's fixed byte count.
    FromCodec,
    /// Payload length is `elements * elem_size` of a flexible codec.
    Elements(usize),
}

struct PendingField {
    name: String,
    codec: Arc<dyn Codec>,
    length: PendingLength,
}

/// Collects field declarations; all validation happens in [`Self::build`].
pub struct SchemaBuilder {
    type_name: String,
    registry: CodecRegistry,
    pending: Vec<PendingField>,
}

impl SchemaBuilder {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self::with_registry(type_name, CodecRegistry::with_defaults())
    }

    pub fn with_registry(type_name: impl Into<String>, registry: CodecRegistry) -> Self {
        Self {
            type_name: type_name.into(),
            registry,
            pending: Vec::new(),
        }
    }

    /// Declares a fixed-width field; the payload length is the codec's byte
    /// count.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        let codec = self.registry.get(kind);
        self.pending.push(PendingField {
            name: name.into(),
            codec,
            length: PendingLength::FromCodec,
        });
        self
    }

    /// Declares a flexible field holding `elements` elements of `kind`.
    pub fn flex_field(mut self, name: impl Into<String>, kind: FieldKind, elements: usize) -> Self {
        let codec = self.registry.get(kind);
        self.pending.push(PendingField {
            name: name.into(),
            codec,
            length: PendingLength::Elements(elements),
        });
        self
    }

    /// Declares a fixed-width field backed by a caller-supplied codec.
    pub fn custom_field(mut self, name: impl Into<String>, codec: Arc<dyn Codec>) -> Self {
        self.pending.push(PendingField {
            name: name.into(),
            codec,
            length: PendingLength::FromCodec,
        });
        self
    }

    /// Declares a flexible field backed by a caller-supplied codec.
    pub fn custom_flex_field(
        mut self,
        name: impl Into<String>,
        codec: Arc<dyn Codec>,
        elements: usize,
    ) -> Self {
        self.pending.push(PendingField {
            name: name.into(),
            codec,
            length: PendingLength::Elements(elements),
        });
        self
    }

    pub fn build(self) -> Result<Schema> {
        if self.pending.is_empty() {
            return Err(Error::InvalidSchema(format!(
                "type '{}' declares no fields",
                self.type_name
            )));
        }
        if self.pending.len() > MAX_FIELD_COUNT {
            return Err(Error::InvalidSchema(format!(
                "type '{}' declares {} fields, maximum is {MAX_FIELD_COUNT}",
                self.type_name,
                self.pending.len()
            )));
        }

        let mut fields: Vec<FieldDef> = Vec::with_capacity(self.pending.len());
        for pending in self.pending {
            let field = resolve_field(pending)?;
            if fields.iter().any(|f| f.name == field.name) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
            fields.push(field);
        }

        let header_size = FIELD_COUNT_SIZE
            + fields
                .iter()
                .map(|f| FIELD_HEADER_OVERHEAD + f.name.len())
                .sum::<usize>();
        let slot_size = OPTIONS_SIZE + fields.iter().map(|f| f.length).sum::<usize>();

        Ok(Schema {
            type_name: self.type_name,
            fields,
            header_size,
            slot_size,
        })
    }
}

fn resolve_field(pending: PendingField) -> Result<FieldDef> {
    let PendingField { name, codec, length } = pending;

    if name.is_empty() {
        return Err(Error::InvalidSchema("empty field name".into()));
    }
    if !name.is_ascii() {
        return Err(Error::InvalidSchema(format!(
            "field name '{name}' is not ASCII"
        )));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::InvalidSchema(format!(
            "field name '{name}' exceeds {MAX_NAME_LEN} bytes"
        )));
    }
    validate_codec(codec.as_ref())?;

    let length = match (codec.kind(), length) {
        (CodecKind::Fixed(n), PendingLength::FromCodec) => n,
        (CodecKind::Flexible { elem_size }, PendingLength::Elements(elements)) => {
            if elements == 0 {
                return Err(Error::InvalidSchema(format!(
                    "flexible field '{name}' declares zero elements"
                )));
            }
            elements * elem_size
        }
        (CodecKind::Fixed(_), PendingLength::Elements(_)) => {
            return Err(Error::InvalidSchema(format!(
                "field '{name}' declares an element count but codec '{}' is fixed",
                codec.name()
            )));
        }
        (CodecKind::Flexible { .. }, PendingLength::FromCodec) => {
            return Err(Error::InvalidSchema(format!(
                "field '{name}' uses flexible codec '{}' without an element count",
                codec.name()
            )));
        }
    };

    if length == 0 || length > MAX_PAYLOAD_LEN {
        return Err(Error::InvalidSchema(format!(
            "field '{name}' payload length {length} is outside 1..={MAX_PAYLOAD_LEN}"
        )));
    }

    Ok(FieldDef { name, length, codec })
}
