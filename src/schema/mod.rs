//! # Schema Layer
//!
//! A schema is the ordered field list of one record type, plus everything the
//! store derives from it: the header bytes, the header size and the slot
//! size. Schemas are built through [`SchemaBuilder`], validated once, and
//! immutable afterwards; registration against an existing file may reorder
//! the fields to match the on-disk header, which is the single source of
//! truth for slot layout.
//!
//! ## Sizes
//!
//! ```text
//! header_size = 2 + Σ (3 + name_len_i)          per-field: 1B name len, name, 2B payload len
//! slot_size   = 1 + Σ payload_len_i             per-slot: 1B options, then payloads
//! ```

mod field;
pub mod header;
mod names;

pub use field::{FieldDef, Schema, SchemaBuilder};
pub use names::{record_file_path, type_file_stem};
