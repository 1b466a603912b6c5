//! # Configuration Constants
//!
//! This module centralizes the limits and layout constants of the record file
//! format. Constants that depend on each other are co-located so a change to
//! one is visible next to the values it constrains.
//!
//! ## On-Disk Encoding Relationships
//!
//! ```text
//! MAX_NAME_LEN (256)
//!       └─> stored as one byte holding (len - 1), so 1..=256 must fit in u8
//!
//! MAX_PAYLOAD_LEN (65536)
//!       └─> stored as two LE bytes holding (len - 1), so 1..=65536 must fit in u16
//!
//! MAX_FIELD_COUNT (65536)
//!       └─> stored as two LE bytes holding (count - 1), same encoding
//!
//! OPTIONS_SIZE (1)
//!       └─> slot size = OPTIONS_SIZE + sum of field payload lengths
//! ```
//!
//! The `- 1` encodings shift the valid ranges down by one so that the full
//! range of the storage integer is usable and zero-length entries cannot be
//! expressed at all.

/// Maximum number of fields in one record type.
pub const MAX_FIELD_COUNT: usize = 65_536;

/// Maximum byte length of a field name (stored as `len - 1` in one byte).
pub const MAX_NAME_LEN: usize = 256;

/// Maximum payload byte length of one field (stored as `len - 1` in two bytes).
pub const MAX_PAYLOAD_LEN: usize = 65_536;

/// Size of the per-slot options byte preceding the field payloads.
pub const OPTIONS_SIZE: usize = 1;

/// Options bit 0: slot is tombstoned. Remaining bits are reserved and must be
/// preserved, never interpreted.
pub const OPTIONS_DELETED: u8 = 0b0000_0001;

/// Size of the leading field-count integer in the file header.
pub const FIELD_COUNT_SIZE: usize = 2;

/// Per-field header overhead besides the name bytes: one name-length byte and
/// two payload-length bytes.
pub const FIELD_HEADER_OVERHEAD: usize = 3;

/// Extension of record files, one file per registered type.
pub const FILE_EXTENSION: &str = "dbobj";

/// Suffix appended to a record file path while a compaction or header
/// migration streams into its replacement.
pub const REWRITE_SUFFIX: &str = "rewrite";

/// Read-buffer size for sequential slot scans. Scans read whole slots, so
/// the effective capacity is at least one slot even for oversized schemas.
pub const SCAN_BUFFER_SIZE: usize = 64 * 1024;

const _: () = assert!(MAX_NAME_LEN - 1 <= u8::MAX as usize);
const _: () = assert!(MAX_PAYLOAD_LEN - 1 <= u16::MAX as usize);
const _: () = assert!(MAX_FIELD_COUNT - 1 <= u16::MAX as usize);
