//! # Codec Registry
//!
//! Maps logical field kinds to shared codec instances. Every registry starts
//! with the default codec set; custom codecs can be registered under a
//! caller-chosen name and referenced from schema construction.
//!
//! Codecs are immutable and shared by `Arc`, so cloning a registry or handing
//! the same codec to many fields costs a reference count.

use super::{
    AsciiCodec, BigIntCodec, BoolCodec, BytesCodec, Codec, CodecKind, F16Codec, F32Codec,
    F64Codec, I16Codec, I32Codec, I64Codec, I8Codec, U16Codec, U32Codec, U64Codec, U8Codec,
    Utf16Codec, UuidCodec,
};
use crate::config::MAX_PAYLOAD_LEN;
use crate::error::{Error, Result};
use hashbrown::HashMap;
use std::sync::Arc;

/// Logical kind of a default field codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F16,
    F32,
    F64,
    Uuid,
    BigInt,
    Utf16,
    Ascii,
    Bytes,
}

impl FieldKind {
    pub const ALL: [FieldKind; 17] = [
        FieldKind::Bool,
        FieldKind::U8,
        FieldKind::U16,
        FieldKind::U32,
        FieldKind::U64,
        FieldKind::I8,
        FieldKind::I16,
        FieldKind::I32,
        FieldKind::I64,
        FieldKind::F16,
        FieldKind::F32,
        FieldKind::F64,
        FieldKind::Uuid,
        FieldKind::BigInt,
        FieldKind::Utf16,
        FieldKind::Ascii,
        FieldKind::Bytes,
    ];
}

fn default_codec(kind: FieldKind) -> Arc<dyn Codec> {
    match kind {
        FieldKind::Bool => Arc::new(BoolCodec),
        FieldKind::U8 => Arc::new(U8Codec),
        FieldKind::U16 => Arc::new(U16Codec),
        FieldKind::U32 => Arc::new(U32Codec),
        FieldKind::U64 => Arc::new(U64Codec),
        FieldKind::I8 => Arc::new(I8Codec),
        FieldKind::I16 => Arc::new(I16Codec),
        FieldKind::I32 => Arc::new(I32Codec),
        FieldKind::I64 => Arc::new(I64Codec),
        FieldKind::F16 => Arc::new(F16Codec),
        FieldKind::F32 => Arc::new(F32Codec),
        FieldKind::F64 => Arc::new(F64Codec),
        FieldKind::Uuid => Arc::new(UuidCodec),
        FieldKind::BigInt => Arc::new(BigIntCodec),
        FieldKind::Utf16 => Arc::new(Utf16Codec),
        FieldKind::Ascii => Arc::new(AsciiCodec),
        FieldKind::Bytes => Arc::new(BytesCodec),
    }
}

/// Shared codec instances, keyed by [`FieldKind`] plus custom names.
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    defaults: HashMap<FieldKind, Arc<dyn Codec>>,
    custom: HashMap<String, Arc<dyn Codec>>,
}

impl CodecRegistry {
    pub fn with_defaults() -> Self {
        let mut defaults = HashMap::with_capacity(FieldKind::ALL.len());
        for kind in FieldKind::ALL {
            defaults.insert(kind, default_codec(kind));
        }
        Self {
            defaults,
            custom: HashMap::new(),
        }
    }

    pub fn get(&self, kind: FieldKind) -> Arc<dyn Codec> {
        Arc::clone(&self.defaults[&kind])
    }

    /// Registers a custom codec. Fails if the name is taken or the codec
    /// declares an impossible payload shape.
    pub fn register(&mut self, name: impl Into<String>, codec: Arc<dyn Codec>) -> Result<()> {
        let name = name.into();
        validate_codec(codec.as_ref())?;
        if self.custom.contains_key(&name) {
            return Err(Error::InvalidSchema(format!(
                "codec '{name}' is already registered"
            )));
        }
        self.custom.insert(name, codec);
        Ok(())
    }

    pub fn custom(&self, name: &str) -> Option<Arc<dyn Codec>> {
        self.custom.get(name).map(Arc::clone)
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// A fixed codec must fit a slot field; a flexible codec must have a nonzero
/// element size.
pub(crate) fn validate_codec(codec: &dyn Codec) -> Result<()> {
    match codec.kind() {
        CodecKind::Fixed(0) => Err(Error::InvalidSchema(format!(
            "codec '{}' declares a zero-byte payload",
            codec.name()
        ))),
        CodecKind::Fixed(n) if n > MAX_PAYLOAD_LEN => Err(Error::InvalidSchema(format!(
            "codec '{}' declares a {n}-byte payload, maximum is {MAX_PAYLOAD_LEN}",
            codec.name()
        ))),
        CodecKind::Flexible { elem_size: 0 } => Err(Error::InvalidSchema(format!(
            "codec '{}' declares a zero-byte element size",
            codec.name()
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_kind() {
        let registry = CodecRegistry::with_defaults();
        for kind in FieldKind::ALL {
            let codec = registry.get(kind);
            assert!(validate_codec(codec.as_ref()).is_ok(), "{kind:?}");
        }
    }

    #[test]
    fn custom_registration_and_lookup() {
        let mut registry = CodecRegistry::with_defaults();
        registry.register("blob", Arc::new(BytesCodec)).unwrap();
        assert!(registry.custom("blob").is_some());
        assert!(registry.custom("missing").is_none());
    }

    #[test]
    fn duplicate_custom_name_is_rejected() {
        let mut registry = CodecRegistry::with_defaults();
        registry.register("blob", Arc::new(BytesCodec)).unwrap();
        let err = registry.register("blob", Arc::new(BytesCodec)).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
    }

    #[derive(Debug)]
    struct OversizedCodec;

    impl Codec for OversizedCodec {
        fn name(&self) -> &'static str {
            "oversized"
        }

        fn kind(&self) -> CodecKind {
            CodecKind::Fixed(MAX_PAYLOAD_LEN + 1)
        }
    }

    #[test]
    fn oversized_fixed_codec_is_rejected() {
        let mut registry = CodecRegistry::with_defaults();
        let err = registry
            .register("oversized", Arc::new(OversizedCodec))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
    }
}
