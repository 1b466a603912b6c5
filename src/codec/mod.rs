//! # Field Codecs
//!
//! A codec translates one [`Value`](crate::types::Value) to and from its byte
//! payload inside a slot. Codecs come in two kinds:
//!
//! - **Fixed** codecs emit and consume a constant number of bytes, a property
//!   of the codec itself (`i32` is always 4 bytes).
//! - **Flexible** codecs emit and consume a payload length declared per field
//!   in the schema, expressed as an element count multiplied by the codec's
//!   element size (a UTF-16 string field declared with 32 elements occupies
//!   64 bytes).
//!
//! ## Pipelines
//!
//! ```text
//! write: value ──codec──> native bytes ──endian──> little-endian ──> disk
//! read:  disk ──> little-endian bytes ──endian──> native ──codec──> value
//! ```
//!
//! The endian step only runs for codecs that report `endian_sensitive()` and
//! is the identity on little-endian targets. Codecs therefore always work in
//! native byte order and never normalize themselves.
//!
//! ## Default Codecs
//!
//! | Codec | Kind | Endian-sensitive |
//! |-------|------|------------------|
//! | bool | fixed 1 | no |
//! | u8/i8 | fixed 1 | no |
//! | u16/i16, u32/i32, u64/i64 | fixed 2/4/8 | yes |
//! | f16, f32, f64 | fixed 2/4/8 | yes |
//! | uuid | fixed 16 | yes |
//! | bigint | fixed 16 | no (stored verbatim) |
//! | utf16 | flexible, 2 bytes/element | yes |
//! | ascii | flexible, 1 byte/element | no |
//! | bytes | flexible, 1 byte/element | no |
//!
//! Calling a fixed codec through the flexible entry points (or vice versa)
//! fails with [`Error::UsageMismatch`](crate::Error::UsageMismatch).

pub mod endian;
mod fixed;
mod flex;
mod registry;

pub use fixed::{
    BigIntCodec, BoolCodec, F16Codec, F32Codec, F64Codec, I16Codec, I32Codec, I64Codec, I8Codec,
    U16Codec, U32Codec, U64Codec, U8Codec, UuidCodec,
};
pub use flex::{AsciiCodec, BytesCodec, Utf16Codec};
pub use registry::{CodecRegistry, FieldKind};
pub(crate) use registry::validate_codec;

use crate::error::{Error, Result};
use crate::types::Value;
use std::fmt;

/// Payload shape of a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    /// Payload is always exactly this many bytes.
    Fixed(usize),
    /// Payload length is declared per field as `element_count * elem_size`.
    Flexible { elem_size: usize },
}

impl CodecKind {
    pub fn is_fixed(&self) -> bool {
        matches!(self, CodecKind::Fixed(_))
    }

    /// Width of one endian-normalization unit: the whole payload for fixed
    /// codecs, one element for flexible ones.
    pub fn elem_width(&self) -> usize {
        match *self {
            CodecKind::Fixed(n) => n,
            CodecKind::Flexible { elem_size } => elem_size,
        }
    }
}

/// Translates values to and from slot payloads.
///
/// Implementations are stateless and shared by reference among every field
/// that uses them. The default method bodies reject the wrong call path so a
/// fixed codec only has to implement the fixed pair and a flexible codec only
/// the flexible pair.
pub trait Codec: fmt::Debug + Send + Sync {
    /// Stable name, used in error messages and custom-codec registration.
    fn name(&self) -> &'static str;

    fn kind(&self) -> CodecKind;

    /// Whether the engine must normalize this codec's payload to
    /// little-endian on the way to disk and back.
    fn endian_sensitive(&self) -> bool {
        false
    }

    fn encode_fixed(&self, value: &Value) -> Result<Vec<u8>> {
        let _ = value;
        Err(Error::UsageMismatch {
            codec: self.name(),
            path: "fixed",
        })
    }

    fn decode_fixed(&self, bytes: &[u8]) -> Result<Value> {
        let _ = bytes;
        Err(Error::UsageMismatch {
            codec: self.name(),
            path: "fixed",
        })
    }

    fn encode_flex(&self, value: &Value, payload_len: usize) -> Result<Vec<u8>> {
        let _ = (value, payload_len);
        Err(Error::UsageMismatch {
            codec: self.name(),
            path: "flexible",
        })
    }

    fn decode_flex(&self, bytes: &[u8], payload_len: usize) -> Result<Value> {
        let _ = (bytes, payload_len);
        Err(Error::UsageMismatch {
            codec: self.name(),
            path: "flexible",
        })
    }
}

/// Drives a codec through whichever path matches its kind, producing exactly
/// `payload_len` native-order bytes.
pub fn encode_payload(codec: &dyn Codec, value: &Value, payload_len: usize) -> Result<Vec<u8>> {
    let bytes = match codec.kind() {
        CodecKind::Fixed(_) => codec.encode_fixed(value)?,
        CodecKind::Flexible { .. } => codec.encode_flex(value, payload_len)?,
    };
    debug_assert_eq!(bytes.len(), payload_len, "codec {} payload length", codec.name());
    Ok(bytes)
}

/// Counterpart of [`encode_payload`] for the read path.
pub fn decode_payload(codec: &dyn Codec, bytes: &[u8], payload_len: usize) -> Result<Value> {
    match codec.kind() {
        CodecKind::Fixed(_) => codec.decode_fixed(bytes),
        CodecKind::Flexible { .. } => codec.decode_flex(bytes, payload_len),
    }
}
