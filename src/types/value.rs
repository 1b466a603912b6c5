//! # Runtime Value Representation
//!
//! [`Value`] is the tagged union the engine moves field data through. Each
//! variant corresponds to one default codec family; custom codecs pick
//! whichever variant matches their payload shape (`Bytes` for opaque data).
//!
//! ## Variants
//!
//! | Variant | Rust type | Default codec |
//! |---------|-----------|---------------|
//! | Bool | bool | 1-byte boolean |
//! | U8..U64 / I8..I64 | u8..u64 / i8..i64 | fixed-width integers |
//! | F16 / F32 / F64 | half::f16 / f32 / f64 | fixed-width floats |
//! | Uuid | [u8; 16] | 16-byte UUID |
//! | BigInt | [u8; 16] | 16-byte big integer, stored verbatim |
//! | Utf16 | String | flexible UTF-16 string (2 bytes per element) |
//! | Ascii | String | flexible ASCII string (1 byte per element) |
//! | Bytes | Vec<u8> | flexible raw buffer |
//!
//! Values are owned; scans decode payload slices into fresh `Value`s so the
//! per-slot read buffer can be reused immediately.

use half::f16;
use smallvec::SmallVec;

/// One field value, tagged by codec family.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F16(f16),
    F32(f32),
    F64(f64),
    Uuid([u8; 16]),
    BigInt([u8; 16]),
    Utf16(String),
    Ascii(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Variant name for error reporting.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F16(_) => "f16",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Uuid(_) => "uuid",
            Value::BigInt(_) => "bigint",
            Value::Utf16(_) => "utf16",
            Value::Ascii(_) => "ascii",
            Value::Bytes(_) => "bytes",
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf16(s) | Value::Ascii(s) => Some(s),
            _ => None,
        }
    }
}

/// One scan hit: the slot id and the requested field values in request order.
///
/// Most projections ask for a handful of fields, so the values live inline up
/// to four entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: u64,
    pub values: SmallVec<[Value; 4]>,
}

impl Row {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            values: SmallVec::new(),
        }
    }
}

/// One fully materialized slot: every field decoded, in on-disk field order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: u64,
    pub values: Vec<Value>,
}
