//! # FuziotDB - Embedded Record Store
//!
//! FuziotDB is an embedded, schema-per-type, SQL-less record store optimized
//! for append-mostly workloads with parallel full-scan retrieval. Each
//! registered record type is bound to one fixed-record file; instances are
//! appended (or recycled into tombstoned slots) and located by multithreaded
//! linear scans evaluating caller-supplied predicates over a projection of
//! fields.
//!
//! ## Quick Start
//!
//! ```ignore
//! use fuziotdb::{Database, FieldKind, Schema, Value};
//!
//! let db = Database::builder().path("./data").open()?;
//! db.register(
//!     Schema::builder("SensorReading")
//!         .field("sensor", FieldKind::U32)
//!         .field("celsius", FieldKind::F32)
//!         .build()?,
//!     false,
//! )?;
//!
//! db.push("SensorReading", &[Value::U32(7), Value::F32(21.5)])?;
//!
//! let hot = db
//!     .par_fetch("SensorReading", &["celsius"], |row| {
//!         matches!(row.values[0], Value::F32(c) if c > 30.0)
//!     })?
//!     .wait_for_result()?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │       Public API (Database)          │
//! ├─────────────────────────────────────┤
//! │  Type Registry  │  Scan Worker Pool  │
//! ├─────────────────┼────────────────────┤
//! │  Store (slot lifecycle, free queue,  │
//! │  per-type RW lock, header migration) │
//! ├─────────────────────────────────────┤
//! │   Schema & Header │ Scan Projection  │
//! ├─────────────────────────────────────┤
//! │     Field Codecs + Endian Layer      │
//! ├─────────────────────────────────────┤
//! │        Buffered File I/O             │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## File Layout
//!
//! One file per record type, named by the snake-cased type name:
//!
//! ```text
//! database_dir/
//! ├── person_data.dbobj
//! └── sensor_reading.dbobj
//! ```
//!
//! Each file is a schema header followed by a contiguous array of equal-size
//! slots; a slot is one options byte (bit 0 = tombstone) and the field
//! payloads in header order. All multi-byte integers are little-endian.
//!
//! ## Concurrency Model
//!
//! - per record type: one writer or many readers, coordinated by a custom
//!   condvar-based lock ([`store::TypeLock`]);
//! - across the database: a fixed pool of scan workers runs one parallel
//!   action at a time; each worker scans a contiguous slot partition through
//!   its own file handle;
//! - cancellation is cooperative, via a shared flag checked between slots.
//!
//! There is no WAL and no fsync coordination: durability is whatever the
//! host filesystem provides.
//!
//! ## Module Overview
//!
//! - [`codec`]: field codecs (fixed and flexible) and endian normalization
//! - [`schema`]: field descriptors, header encoding, schema builder
//! - [`store`]: record files, slot lifecycle, free queue, header migration
//! - [`scan`]: projections, scan shapes, worker pool, cancellation
//! - [`database`]: the public facade tying stores to the pool

pub mod codec;
pub mod config;
pub mod database;
pub mod error;
pub mod scan;
pub mod schema;
pub mod store;
pub mod types;

pub use codec::{Codec, CodecKind, CodecRegistry, FieldKind};
pub use database::{Database, DatabaseBuilder};
pub use error::{Error, Result};
pub use scan::{CancelToken, TaskHandle};
pub use schema::{FieldDef, Schema, SchemaBuilder};
pub use store::Store;
pub use types::{Record, Row, Value};
