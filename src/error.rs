//! # Error Types
//!
//! All fallible operations in the crate return [`Result`], an alias over the
//! single [`Error`] enum. Variants are coarse-grained by failure class so
//! callers can match on the kind without string inspection:
//!
//! | Variant | Raised by |
//! |---------|-----------|
//! | `InvalidSchema` | schema builder validation |
//! | `HeaderMismatch` | registration against an existing file without `upgrade` |
//! | `NotFound` | `set`/`free` addressing a slot beyond end-of-file |
//! | `UnknownField` | scan projection over a name the schema lacks |
//! | `UsageMismatch` | fixed codec driven through the flexible path or vice versa |
//! | `ValueMismatch` | codec handed a value of the wrong variant |
//! | `Io` | any underlying filesystem failure |
//! | `Corruption` | on-disk header inconsistent with the file length |
//!
//! Worker threads surface their error through their result slot; the facade
//! reports the first observed worker error in worker-index order.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("on-disk header does not match declared schema: {0}")]
    HeaderMismatch(String),

    #[error("slot {id} is beyond the end of the file")]
    NotFound { id: u64 },

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("record type '{0}' is not registered")]
    UnknownType(String),

    #[error("codec '{codec}' does not support the {path} path")]
    UsageMismatch {
        codec: &'static str,
        path: &'static str,
    },

    #[error("codec '{codec}' expected a {expected} value, got {got}")]
    ValueMismatch {
        codec: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt record file: {0}")]
    Corruption(String),
}

impl Error {
    /// True when retrying the identical call cannot succeed (caller bug
    /// rather than environmental failure).
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::InvalidSchema(_)
                | Error::UnknownField(_)
                | Error::UsageMismatch { .. }
                | Error::ValueMismatch { .. }
        )
    }
}
