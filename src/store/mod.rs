//! # Record Store
//!
//! One [`Store`] owns one record file: a header describing the schema
//! followed by a contiguous array of fixed-size slots. The module implements
//! the slot lifecycle (append, in-place replace, tombstone, recycle, scrub,
//! compact), the FIFO free-slot queue, the per-type reader/writer lock and
//! the header-migration procedure used when a declared schema diverges from
//! the on-disk header.
//!
//! ## File Layout
//!
//! ```text
//! +--------------------+
//! | header             |  field count + per-field headers (see schema::header)
//! +--------------------+
//! | slot 0             |  1B options || payload_0 || payload_1 || ...
//! +--------------------+
//! | slot 1             |
//! +--------------------+
//! | ...                |
//! ```
//!
//! Every slot has identical byte length, so slot id maps to file offset by
//! multiplication. A tombstoned slot (options bit 0 set) keeps its bytes and
//! its position; scans skip it and the free queue offers its id for reuse.
//!
//! ## Locking Discipline
//!
//! Each store carries its own [`TypeLock`]: many concurrent readers or one
//! writer. Mutating operations take the write lock, scans take the read
//! lock. Where both the type lock and the inner file mutex are needed, the
//! type lock is always acquired first.

mod freelist;
mod lock;
mod table;
mod upgrade;

pub use freelist::FreeQueue;
pub use lock::{ReadGuard, TypeLock, WriteGuard};
pub use table::Store;
