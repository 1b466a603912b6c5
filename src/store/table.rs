//! # Store — One Record Type's File
//!
//! A [`Store`] binds a validated [`Schema`] to its record file and implements
//! the slot lifecycle. The interesting invariants:
//!
//! - the on-disk header is authoritative for field order; registration
//!   reorders the in-memory schema to match it;
//! - `file_len == header_size + slot_count * slot_size` at every quiescent
//!   point, checked at open and maintained by every mutation;
//! - tombstoned slots keep their bytes; only [`Store::purge`] changes slot
//!   positions (and therefore ids);
//! - the free queue only holds ids whose Deleted bit is set, and mutates
//!   exclusively under the write lock.
//!
//! There is no durability contract: a crash mid-push can leave the last slot
//! corrupt, surfaced to the caller as an `Io` error with the id withheld from
//! the free queue.

use crate::codec::{encode_payload, endian};
use crate::config::{OPTIONS_DELETED, OPTIONS_SIZE, REWRITE_SUFFIX};
use crate::error::{Error, Result};
use crate::scan::{engine, CancelToken};
use crate::schema::{header, record_file_path, Schema};
use crate::store::freelist::FreeQueue;
use crate::store::lock::{ReadGuard, TypeLock, WriteGuard};
use crate::store::upgrade;
use crate::types::{Record, Row, Value};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Runtime state of one registered record type.
#[derive(Debug)]
pub struct Store {
    schema: Schema,
    path: PathBuf,
    lock: Arc<TypeLock>,
    file_len: AtomicU64,
    inner: Mutex<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    file: File,
    free: FreeQueue,
}

impl Store {
    /// Registers a record type under `dir`: creates the file and header if
    /// absent, otherwise validates the on-disk header against the schema
    /// (migrating it when `upgrade` is set), reorders the schema to the
    /// on-disk field order, and rebuilds the free queue from the tombstones.
    pub(crate) fn open(dir: &Path, schema: Schema, upgrade_header: bool) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = record_file_path(dir, schema.type_name());
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        let mut schema = schema;

        if file.metadata()?.len() == 0 {
            file.write_all(&header::encode(schema.fields()))?;
            tracing::debug!(
                type_name = schema.type_name(),
                path = %path.display(),
                "created record file"
            );
        } else {
            file.seek(SeekFrom::Start(0))?;
            let disk_fields = header::parse(&mut BufReader::new(&mut file))?;
            let disk_pairs: Vec<(String, usize)> = disk_fields
                .iter()
                .map(|f| (f.name.clone(), f.length))
                .collect();
            match schema.reorder_to(&disk_pairs) {
                Ok(reordered) => schema = reordered,
                Err(Error::HeaderMismatch(reason)) if upgrade_header => {
                    tracing::debug!(
                        type_name = schema.type_name(),
                        %reason,
                        "migrating record file header"
                    );
                    upgrade::migrate(&path, &disk_fields, &schema)?;
                    file = OpenOptions::new().read(true).write(true).open(&path)?;
                }
                Err(e) => return Err(e),
            }
        }

        let file_len = file.metadata()?.len();
        let header_size = schema.header_size() as u64;
        let slot_size = schema.slot_size() as u64;
        if file_len < header_size || (file_len - header_size) % slot_size != 0 {
            return Err(Error::Corruption(format!(
                "file length {file_len} does not hold a {header_size}-byte header plus whole \
                 {slot_size}-byte slots"
            )));
        }

        let slots = (file_len - header_size) / slot_size;
        let free = rebuild_free_queue(&mut file, header_size, slot_size, slots)?;
        tracing::debug!(
            type_name = schema.type_name(),
            slots,
            free = free.len(),
            "registered record type"
        );

        Ok(Store {
            schema,
            path,
            lock: TypeLock::new(),
            file_len: AtomicU64::new(file_len),
            inner: Mutex::new(StoreInner { file, free }),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total physical slots, tombstoned ones included.
    pub fn slot_count(&self) -> u64 {
        let header_size = self.schema.header_size() as u64;
        let slot_size = self.schema.slot_size() as u64;
        (self.file_len.load(Ordering::Acquire) - header_size) / slot_size
    }

    /// Live slots: physical slots minus the free queue.
    pub fn instance_count(&self) -> u64 {
        let _read = self.lock.read();
        let inner = self.inner.lock();
        self.slot_count() - inner.free.len() as u64
    }

    /// Ids currently awaiting recycling.
    pub fn free_count(&self) -> usize {
        let _read = self.lock.read();
        self.inner.lock().free.len()
    }

    pub(crate) fn read_guard(&self) -> ReadGuard {
        self.lock.read()
    }

    fn write_guard(&self) -> WriteGuard {
        self.lock.write()
    }

    /// Appends an instance, recycling the oldest tombstoned slot when one is
    /// available. Returns the slot id.
    pub fn push(&self, values: &[Value]) -> Result<u64> {
        let slot = self.encode_slot(values)?;
        let _write = self.write_guard();
        let mut inner = self.inner.lock();

        let header_size = self.schema.header_size() as u64;
        let slot_size = self.schema.slot_size() as u64;
        let id = match inner.free.pop() {
            Some(id) => id,
            None => self.slot_count(),
        };

        let offset = header_size + id * slot_size;
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.write_all(&slot)?;

        let end = offset + slot_size;
        if end > self.file_len.load(Ordering::Acquire) {
            self.file_len.store(end, Ordering::Release);
        }
        Ok(id)
    }

    /// Replaces the payloads of an existing slot in place. The options byte
    /// is left untouched, so tombstone status survives a `set`.
    pub fn set(&self, id: u64, values: &[Value]) -> Result<()> {
        let payload = self.encode_payloads(values)?;
        let _write = self.write_guard();
        let mut inner = self.inner.lock();

        if id >= self.slot_count() {
            return Err(Error::NotFound { id });
        }
        let offset =
            self.schema.header_size() as u64 + id * self.schema.slot_size() as u64 + OPTIONS_SIZE as u64;
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.write_all(&payload)?;
        Ok(())
    }

    /// Tombstones a slot and queues its id for recycling. Freeing an already
    /// tombstoned slot is a no-op beyond re-setting the bit.
    pub fn free(&self, id: u64) -> Result<()> {
        let _write = self.write_guard();
        let mut inner = self.inner.lock();
        self.free_one(&mut inner, id)
    }

    /// Tombstones a batch of slots under a single write-lock acquisition.
    pub fn free_many(&self, ids: &[u64]) -> Result<()> {
        let _write = self.write_guard();
        let mut inner = self.inner.lock();
        for &id in ids {
            self.free_one(&mut inner, id)?;
        }
        Ok(())
    }

    fn free_one(&self, inner: &mut StoreInner, id: u64) -> Result<()> {
        if id >= self.slot_count() {
            return Err(Error::NotFound { id });
        }
        let offset = self.schema.header_size() as u64 + id * self.schema.slot_size() as u64;
        inner.file.seek(SeekFrom::Start(offset))?;
        let mut options = [0u8; 1];
        inner.file.read_exact(&mut options)?;
        options[0] |= OPTIONS_DELETED;
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.write_all(&options)?;
        inner.free.push(id);
        Ok(())
    }

    /// True when `id` addresses a live (in-range, not tombstoned) slot.
    pub fn contains(&self, id: u64) -> Result<bool> {
        let _read = self.lock.read();
        if id >= self.slot_count() {
            return Ok(false);
        }
        let mut inner = self.inner.lock();
        let offset = self.schema.header_size() as u64 + id * self.schema.slot_size() as u64;
        inner.file.seek(SeekFrom::Start(offset))?;
        let mut options = [0u8; 1];
        inner.file.read_exact(&mut options)?;
        Ok(options[0] & OPTIONS_DELETED == 0)
    }

    /// Compacts the file by streaming every live slot into a sibling rewrite
    /// file and atomically swapping it in. Slot ids shift; the free queue is
    /// emptied.
    pub fn purge(&self) -> Result<()> {
        let _write = self.write_guard();
        let mut inner = self.inner.lock();

        let header_size = self.schema.header_size();
        let slot_size = self.schema.slot_size();
        let rewrite = rewrite_path(&self.path);
        let mut kept = 0u64;
        {
            let mut reader = BufReader::new(File::open(&self.path)?);
            let mut writer = std::io::BufWriter::new(File::create(&rewrite)?);

            let mut head = vec![0u8; header_size];
            reader.read_exact(&mut head)?;
            writer.write_all(&head)?;

            let mut slot = vec![0u8; slot_size];
            for _ in 0..self.slot_count() {
                reader.read_exact(&mut slot)?;
                if slot[0] & OPTIONS_DELETED != 0 {
                    continue;
                }
                writer.write_all(&slot)?;
                kept += 1;
            }
            writer.flush()?;
        }
        fs::rename(&rewrite, &self.path)?;

        inner.file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        inner.free.clear();
        self.file_len.store(
            header_size as u64 + kept * slot_size as u64,
            Ordering::Release,
        );
        tracing::debug!(type_name = self.schema.type_name(), kept, "purged record file");
        Ok(())
    }

    /// Scrubs the payload bytes of every queued tombstone to zero without
    /// moving any slot. Tombstone bits and the free queue are preserved.
    pub fn purge_keep(&self) -> Result<()> {
        let _write = self.write_guard();
        let mut inner = self.inner.lock();

        let header_size = self.schema.header_size() as u64;
        let slot_size = self.schema.slot_size() as u64;
        let zeros = vec![0u8; slot_size as usize - OPTIONS_SIZE];
        let ids: Vec<u64> = inner.free.iter().collect();
        for id in ids {
            let offset = header_size + id * slot_size + OPTIONS_SIZE as u64;
            inner.file.seek(SeekFrom::Start(offset))?;
            inner.file.write_all(&zeros)?;
        }
        Ok(())
    }

    /// Single-threaded scan yielding the requested fields of every matching
    /// live slot, in file order.
    pub fn fetch<P>(&self, fields: &[&str], mut pred: P) -> Result<Vec<Row>>
    where
        P: FnMut(&Row) -> bool,
    {
        engine::fetch_sync(self, fields, move |row, _| pred(row))
    }

    /// [`Store::fetch`] with a cancellation flag the predicate may set to
    /// stop the scan after the current slot.
    pub fn fetch_cancellable<P>(&self, fields: &[&str], pred: P) -> Result<Vec<Row>>
    where
        P: FnMut(&Row, &CancelToken) -> bool,
    {
        engine::fetch_sync(self, fields, pred)
    }

    /// Single-threaded scan materializing every field of matching slots.
    pub fn fetch_full<P>(&self, mut pred: P) -> Result<Vec<Record>>
    where
        P: FnMut(&Record) -> bool,
    {
        engine::fetch_full_sync(self, move |record, _| pred(record))
    }

    pub fn fetch_full_cancellable<P>(&self, pred: P) -> Result<Vec<Record>>
    where
        P: FnMut(&Record, &CancelToken) -> bool,
    {
        engine::fetch_full_sync(self, pred)
    }

    /// Single-threaded scan counting matching live slots.
    pub fn count<P>(&self, fields: &[&str], mut pred: P) -> Result<u64>
    where
        P: FnMut(&Row) -> bool,
    {
        engine::count_sync(self, fields, move |row, _| pred(row))
    }

    pub fn count_cancellable<P>(&self, fields: &[&str], pred: P) -> Result<u64>
    where
        P: FnMut(&Row, &CancelToken) -> bool,
    {
        engine::count_sync(self, fields, pred)
    }

    fn encode_slot(&self, values: &[Value]) -> Result<Vec<u8>> {
        let mut slot = Vec::with_capacity(self.schema.slot_size());
        slot.push(0u8);
        self.encode_payloads_into(&mut slot, values)?;
        Ok(slot)
    }

    fn encode_payloads(&self, values: &[Value]) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.schema.slot_size() - OPTIONS_SIZE);
        self.encode_payloads_into(&mut buf, values)?;
        Ok(buf)
    }

    /// Encodes field payloads in header order, endian-normalized for disk.
    fn encode_payloads_into(&self, buf: &mut Vec<u8>, values: &[Value]) -> Result<()> {
        let fields = self.schema.fields();
        if values.len() != fields.len() {
            return Err(Error::InvalidSchema(format!(
                "instance has {} values, type '{}' has {} fields",
                values.len(),
                self.schema.type_name(),
                fields.len()
            )));
        }
        for (field, value) in fields.iter().zip(values) {
            let mut payload = encode_payload(field.codec().as_ref(), value, field.length())?;
            if field.codec().endian_sensitive() {
                endian::to_disk(&mut payload, field.codec().kind().elem_width());
            }
            buf.extend_from_slice(&payload);
        }
        Ok(())
    }
}

fn rewrite_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(REWRITE_SUFFIX);
    PathBuf::from(name)
}

fn rebuild_free_queue(
    file: &mut File,
    header_size: u64,
    slot_size: u64,
    slots: u64,
) -> Result<FreeQueue> {
    let mut free = FreeQueue::new();
    if slots == 0 {
        return Ok(free);
    }
    file.seek(SeekFrom::Start(header_size))?;
    let mut reader = BufReader::new(file);
    let mut options = [0u8; 1];
    for id in 0..slots {
        reader.read_exact(&mut options)?;
        if options[0] & OPTIONS_DELETED != 0 {
            free.push(id);
        }
        reader.seek_relative(slot_size as i64 - 1)?;
    }
    Ok(free)
}
