//! # Fixed-Width Codecs
//!
//! Codecs whose payload size is a constant of the codec: the boolean byte,
//! the integer and float families, UUIDs and 16-byte big integers.
//!
//! Numeric codecs emit native byte order; the engine's endian step turns that
//! into little-endian on disk. The big-integer codec is the deliberate
//! exception: its payload is stored verbatim in host order, so files with
//! big-integer fields are not portable across byte orders unless a portable
//! codec is substituted.

use super::{Codec, CodecKind};
use crate::error::{Error, Result};
use crate::types::Value;

/// 1-byte boolean. Writes `0xFF` for true and `0x00` for false; decodes by
/// popcount majority (5 or more set bits reads as true), tolerating single
/// flipped bits in either direction.
#[derive(Debug)]
pub struct BoolCodec;

impl Codec for BoolCodec {
    fn name(&self) -> &'static str {
        "bool"
    }

    fn kind(&self) -> CodecKind {
        CodecKind::Fixed(1)
    }

    fn encode_fixed(&self, value: &Value) -> Result<Vec<u8>> {
        match value {
            Value::Bool(true) => Ok(vec![0xFF]),
            Value::Bool(false) => Ok(vec![0x00]),
            other => Err(Error::ValueMismatch {
                codec: self.name(),
                expected: "bool",
                got: other.kind_name(),
            }),
        }
    }

    fn decode_fixed(&self, bytes: &[u8]) -> Result<Value> {
        let byte = expect_len::<1>(self.name(), bytes)?[0];
        Ok(Value::Bool(byte.count_ones() >= 5))
    }
}

/// Checks the payload length of a fixed codec and converts it to an array.
fn expect_len<const N: usize>(codec: &'static str, bytes: &[u8]) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        Error::Corruption(format!(
            "{} payload must be {} bytes, got {}",
            codec,
            N,
            bytes.len()
        ))
    })
}

macro_rules! numeric_codec {
    ($codec:ident, $variant:ident, $ty:ty, $name:literal) => {
        #[derive(Debug)]
        pub struct $codec;

        impl Codec for $codec {
            fn name(&self) -> &'static str {
                $name
            }

            fn kind(&self) -> CodecKind {
                CodecKind::Fixed(std::mem::size_of::<$ty>())
            }

            fn endian_sensitive(&self) -> bool {
                std::mem::size_of::<$ty>() > 1
            }

            fn encode_fixed(&self, value: &Value) -> Result<Vec<u8>> {
                match value {
                    Value::$variant(v) => Ok(v.to_ne_bytes().to_vec()),
                    other => Err(Error::ValueMismatch {
                        codec: $name,
                        expected: $name,
                        got: other.kind_name(),
                    }),
                }
            }

            fn decode_fixed(&self, bytes: &[u8]) -> Result<Value> {
                let arr = expect_len::<{ std::mem::size_of::<$ty>() }>($name, bytes)?;
                Ok(Value::$variant(<$ty>::from_ne_bytes(arr)))
            }
        }
    };
}

numeric_codec!(U8Codec, U8, u8, "u8");
numeric_codec!(U16Codec, U16, u16, "u16");
numeric_codec!(U32Codec, U32, u32, "u32");
numeric_codec!(U64Codec, U64, u64, "u64");
numeric_codec!(I8Codec, I8, i8, "i8");
numeric_codec!(I16Codec, I16, i16, "i16");
numeric_codec!(I32Codec, I32, i32, "i32");
numeric_codec!(I64Codec, I64, i64, "i64");
numeric_codec!(F16Codec, F16, half::f16, "f16");
numeric_codec!(F32Codec, F32, f32, "f32");
numeric_codec!(F64Codec, F64, f64, "f64");

/// 16-byte UUID, treated as one 16-byte integer for endian purposes.
#[derive(Debug)]
pub struct UuidCodec;

impl Codec for UuidCodec {
    fn name(&self) -> &'static str {
        "uuid"
    }

    fn kind(&self) -> CodecKind {
        CodecKind::Fixed(16)
    }

    fn endian_sensitive(&self) -> bool {
        true
    }

    fn encode_fixed(&self, value: &Value) -> Result<Vec<u8>> {
        match value {
            Value::Uuid(bytes) => Ok(bytes.to_vec()),
            other => Err(Error::ValueMismatch {
                codec: self.name(),
                expected: "uuid",
                got: other.kind_name(),
            }),
        }
    }

    fn decode_fixed(&self, bytes: &[u8]) -> Result<Value> {
        Ok(Value::Uuid(expect_len::<16>(self.name(), bytes)?))
    }
}

/// 16-byte big integer, stored verbatim in host byte order.
#[derive(Debug)]
pub struct BigIntCodec;

impl Codec for BigIntCodec {
    fn name(&self) -> &'static str {
        "bigint"
    }

    fn kind(&self) -> CodecKind {
        CodecKind::Fixed(16)
    }

    fn encode_fixed(&self, value: &Value) -> Result<Vec<u8>> {
        match value {
            Value::BigInt(bytes) => Ok(bytes.to_vec()),
            other => Err(Error::ValueMismatch {
                codec: self.name(),
                expected: "bigint",
                got: other.kind_name(),
            }),
        }
    }

    fn decode_fixed(&self, bytes: &[u8]) -> Result<Value> {
        Ok(Value::BigInt(expect_len::<16>(self.name(), bytes)?))
    }
}
