//! # Database Facade
//!
//! [`Database`] owns the registry of record types and the scan worker pool,
//! and forwards every per-type operation to the type's [`Store`]. Types are
//! independent: each store has its own file and its own reader/writer lock,
//! so pushing into one type never blocks scans of another. The pool is the
//! one shared resource — it executes a single parallel action at a time, and
//! dispatching a new one waits for the previous action to drain.
//!
//! ## Usage
//!
//! ```ignore
//! use fuziotdb::{Database, FieldKind, Schema, Value};
//!
//! let db = Database::builder().path("./data").open()?;
//! db.register(
//!     Schema::builder("PersonData")
//!         .field("age", FieldKind::U8)
//!         .flex_field("name", FieldKind::Ascii, 32)
//!         .build()?,
//!     false,
//! )?;
//!
//! let id = db.push("PersonData", &[Value::U8(34), Value::Ascii("ada".into())])?;
//! let adults = db.fetch("PersonData", &["age"], |row| {
//!     matches!(row.values[0], Value::U8(age) if age >= 18)
//! })?;
//! # let _ = (id, adults);
//! ```

mod builder;

pub use builder::DatabaseBuilder;

use crate::error::{Error, Result};
use crate::scan::{engine, CancelToken, ScanPool, TaskHandle};
use crate::schema::Schema;
use crate::store::Store;
use crate::types::{Record, Row, Value};
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Embedded record database: a directory of record files plus a scan pool.
pub struct Database {
    dir: PathBuf,
    registry: RwLock<HashMap<String, Arc<Store>>>,
    pool: ScanPool,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Opens a database under `dir` with the default worker count (one per
    /// logical core).
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(dir.as_ref().to_path_buf()).open()
    }

    pub(crate) fn with_pool(dir: PathBuf, pool: ScanPool) -> Self {
        Self {
            dir,
            registry: RwLock::new(HashMap::new()),
            pool,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Worker threads available to parallel scans.
    pub fn worker_count(&self) -> usize {
        self.pool.workers()
    }

    /// Registers a record type: creates or validates its file, optionally
    /// migrating a divergent header when `upgrade` is set.
    pub fn register(&self, schema: Schema, upgrade: bool) -> Result<()> {
        let mut registry = self.registry.write();
        if registry.contains_key(schema.type_name()) {
            return Err(Error::InvalidSchema(format!(
                "type '{}' is already registered",
                schema.type_name()
            )));
        }
        let name = schema.type_name().to_string();
        let store = Store::open(&self.dir, schema, upgrade)?;
        registry.insert(name, Arc::new(store));
        Ok(())
    }

    /// The store backing a registered type.
    pub fn store(&self, type_name: &str) -> Result<Arc<Store>> {
        self.registry
            .read()
            .get(type_name)
            .cloned()
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))
    }

    /// Registered type names, unordered.
    pub fn types(&self) -> Vec<String> {
        self.registry.read().keys().cloned().collect()
    }

    /// The (possibly reordered) schema of a registered type.
    pub fn schema(&self, type_name: &str) -> Result<Schema> {
        Ok(self.store(type_name)?.schema().clone())
    }

    pub fn push(&self, type_name: &str, values: &[Value]) -> Result<u64> {
        self.store(type_name)?.push(values)
    }

    pub fn set(&self, type_name: &str, id: u64, values: &[Value]) -> Result<()> {
        self.store(type_name)?.set(id, values)
    }

    pub fn free(&self, type_name: &str, id: u64) -> Result<()> {
        self.store(type_name)?.free(id)
    }

    pub fn free_many(&self, type_name: &str, ids: &[u64]) -> Result<()> {
        self.store(type_name)?.free_many(ids)
    }

    pub fn purge(&self, type_name: &str) -> Result<()> {
        self.store(type_name)?.purge()
    }

    pub fn purge_keep(&self, type_name: &str) -> Result<()> {
        self.store(type_name)?.purge_keep()
    }

    pub fn contains(&self, type_name: &str, id: u64) -> Result<bool> {
        self.store(type_name)?.contains(id)
    }

    pub fn instance_count(&self, type_name: &str) -> Result<u64> {
        Ok(self.store(type_name)?.instance_count())
    }

    pub fn fetch<P>(&self, type_name: &str, fields: &[&str], pred: P) -> Result<Vec<Row>>
    where
        P: FnMut(&Row) -> bool,
    {
        self.store(type_name)?.fetch(fields, pred)
    }

    pub fn fetch_cancellable<P>(
        &self,
        type_name: &str,
        fields: &[&str],
        pred: P,
    ) -> Result<Vec<Row>>
    where
        P: FnMut(&Row, &CancelToken) -> bool,
    {
        self.store(type_name)?.fetch_cancellable(fields, pred)
    }

    pub fn fetch_full<P>(&self, type_name: &str, pred: P) -> Result<Vec<Record>>
    where
        P: FnMut(&Record) -> bool,
    {
        self.store(type_name)?.fetch_full(pred)
    }

    pub fn fetch_full_cancellable<P>(&self, type_name: &str, pred: P) -> Result<Vec<Record>>
    where
        P: FnMut(&Record, &CancelToken) -> bool,
    {
        self.store(type_name)?.fetch_full_cancellable(pred)
    }

    pub fn count<P>(&self, type_name: &str, fields: &[&str], pred: P) -> Result<u64>
    where
        P: FnMut(&Row) -> bool,
    {
        self.store(type_name)?.count(fields, pred)
    }

    pub fn count_cancellable<P>(&self, type_name: &str, fields: &[&str], pred: P) -> Result<u64>
    where
        P: FnMut(&Row, &CancelToken) -> bool,
    {
        self.store(type_name)?.count_cancellable(fields, pred)
    }

    /// Partitioned fetch across the pool. The handle's result concatenates
    /// worker parts in worker-index order, not file order.
    pub fn par_fetch<P>(
        &self,
        type_name: &str,
        fields: &[&str],
        pred: P,
    ) -> Result<TaskHandle<Vec<Row>>>
    where
        P: Fn(&Row) -> bool + Send + Sync + 'static,
    {
        self.par_fetch_cancellable(type_name, fields, move |row, _| pred(row))
    }

    pub fn par_fetch_cancellable<P>(
        &self,
        type_name: &str,
        fields: &[&str],
        pred: P,
    ) -> Result<TaskHandle<Vec<Row>>>
    where
        P: Fn(&Row, &CancelToken) -> bool + Send + Sync + 'static,
    {
        engine::fetch_parallel(&self.store(type_name)?, &self.pool, fields, pred)
    }

    pub fn par_fetch_full<P>(&self, type_name: &str, pred: P) -> Result<TaskHandle<Vec<Record>>>
    where
        P: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.par_fetch_full_cancellable(type_name, move |record, _| pred(record))
    }

    pub fn par_fetch_full_cancellable<P>(
        &self,
        type_name: &str,
        pred: P,
    ) -> Result<TaskHandle<Vec<Record>>>
    where
        P: Fn(&Record, &CancelToken) -> bool + Send + Sync + 'static,
    {
        engine::fetch_full_parallel(&self.store(type_name)?, &self.pool, pred)
    }

    pub fn par_count<P>(&self, type_name: &str, fields: &[&str], pred: P) -> Result<TaskHandle<u64>>
    where
        P: Fn(&Row) -> bool + Send + Sync + 'static,
    {
        self.par_count_cancellable(type_name, fields, move |row, _| pred(row))
    }

    pub fn par_count_cancellable<P>(
        &self,
        type_name: &str,
        fields: &[&str],
        pred: P,
    ) -> Result<TaskHandle<u64>>
    where
        P: Fn(&Row, &CancelToken) -> bool + Send + Sync + 'static,
    {
        engine::count_parallel(&self.store(type_name)?, &self.pool, fields, pred)
    }

    /// Waits for any in-flight parallel action and joins the worker pool.
    /// Dropping the database does the same.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("dir", &self.dir)
            .field("types", &self.registry.read().len())
            .field("workers", &self.pool.workers())
            .finish()
    }
}
