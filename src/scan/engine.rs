//! # Scan Execution
//!
//! The actual slot loops behind fetch / fetch-full / count. One range runner
//! serves every shape: it reads whole slots sequentially through a buffered
//! reader, skips tombstones, honors the cancellation flag between slots, and
//! hands live slots to a per-shape callback.
//!
//! ## Partitioning
//!
//! For `n` slots across `t` workers, worker `i < t-1` scans the `n / t`
//! consecutive slots starting at `(n / t) * i`; the last worker takes the
//! remainder. Workers open independent file handles, so partitions never
//! contend on a shared cursor.

use super::cancel::CancelToken;
use super::handle::TaskHandle;
use super::pool::ScanPool;
use super::projection::Projection;
use crate::config::{OPTIONS_DELETED, SCAN_BUFFER_SIZE};
use crate::error::Result;
use crate::store::Store;
use crate::types::{Record, Row};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

/// Reads slots `start .. start + count`, invoking `on_live` for every slot
/// whose Deleted bit is clear. Checks `token` between slots.
fn scan_range(
    path: &Path,
    header_size: usize,
    slot_size: usize,
    start: u64,
    count: u64,
    token: &CancelToken,
    mut on_live: impl FnMut(u64, &[u8]) -> Result<()>,
) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(SCAN_BUFFER_SIZE.max(slot_size), file);
    reader.seek(SeekFrom::Start(
        header_size as u64 + start * slot_size as u64,
    ))?;

    let mut slot = vec![0u8; slot_size];
    for i in 0..count {
        if token.is_cancelled() {
            break;
        }
        reader.read_exact(&mut slot)?;
        if slot[0] & OPTIONS_DELETED != 0 {
            continue;
        }
        on_live(start + i, &slot)?;
    }
    Ok(())
}

pub(crate) fn fetch_sync<P>(store: &Store, fields: &[&str], mut pred: P) -> Result<Vec<Row>>
where
    P: FnMut(&Row, &CancelToken) -> bool,
{
    let projection = Projection::resolve(store.schema(), fields)?;
    let token = CancelToken::new();
    let _read = store.read_guard();

    let mut rows = Vec::new();
    scan_range(
        store.path(),
        store.schema().header_size(),
        store.schema().slot_size(),
        0,
        store.slot_count(),
        &token,
        |id, slot| {
            let row = projection.decode_row(id, slot)?;
            if pred(&row, &token) {
                rows.push(row);
            }
            Ok(())
        },
    )?;
    Ok(rows)
}

pub(crate) fn fetch_full_sync<P>(store: &Store, mut pred: P) -> Result<Vec<Record>>
where
    P: FnMut(&Record, &CancelToken) -> bool,
{
    let projection = Projection::full(store.schema());
    let token = CancelToken::new();
    let _read = store.read_guard();

    let mut records = Vec::new();
    scan_range(
        store.path(),
        store.schema().header_size(),
        store.schema().slot_size(),
        0,
        store.slot_count(),
        &token,
        |id, slot| {
            let record = projection.decode_record(id, slot)?;
            if pred(&record, &token) {
                records.push(record);
            }
            Ok(())
        },
    )?;
    Ok(records)
}

pub(crate) fn count_sync<P>(store: &Store, fields: &[&str], mut pred: P) -> Result<u64>
where
    P: FnMut(&Row, &CancelToken) -> bool,
{
    let projection = Projection::resolve(store.schema(), fields)?;
    let token = CancelToken::new();
    let _read = store.read_guard();

    let mut matches = 0u64;
    scan_range(
        store.path(),
        store.schema().header_size(),
        store.schema().slot_size(),
        0,
        store.slot_count(),
        &token,
        |id, slot| {
            let row = projection.decode_row(id, slot)?;
            if pred(&row, &token) {
                matches += 1;
            }
            Ok(())
        },
    )?;
    Ok(matches)
}

pub(crate) fn fetch_parallel<P>(
    store: &Arc<Store>,
    pool: &ScanPool,
    fields: &[&str],
    pred: P,
) -> Result<TaskHandle<Vec<Row>>>
where
    P: Fn(&Row, &CancelToken) -> bool + Send + Sync + 'static,
{
    let projection = Arc::new(Projection::resolve(store.schema(), fields)?);
    let pred = Arc::new(pred);
    parallel_scan(store, pool, concat, move |id, slot, token, out: &mut Vec<Row>| {
        let row = projection.decode_row(id, slot)?;
        if pred(&row, token) {
            out.push(row);
        }
        Ok(())
    })
}

pub(crate) fn fetch_full_parallel<P>(
    store: &Arc<Store>,
    pool: &ScanPool,
    pred: P,
) -> Result<TaskHandle<Vec<Record>>>
where
    P: Fn(&Record, &CancelToken) -> bool + Send + Sync + 'static,
{
    let projection = Arc::new(Projection::full(store.schema()));
    let pred = Arc::new(pred);
    parallel_scan(
        store,
        pool,
        concat,
        move |id, slot, token, out: &mut Vec<Record>| {
            let record = projection.decode_record(id, slot)?;
            if pred(&record, token) {
                out.push(record);
            }
            Ok(())
        },
    )
}

pub(crate) fn count_parallel<P>(
    store: &Arc<Store>,
    pool: &ScanPool,
    fields: &[&str],
    pred: P,
) -> Result<TaskHandle<u64>>
where
    P: Fn(&Row, &CancelToken) -> bool + Send + Sync + 'static,
{
    let projection = Arc::new(Projection::resolve(store.schema(), fields)?);
    let pred = Arc::new(pred);
    parallel_scan(store, pool, sum, move |id, slot, token, matches: &mut u64| {
        let row = projection.decode_row(id, slot)?;
        if pred(&row, token) {
            *matches += 1;
        }
        Ok(())
    })
}

/// Shared parallel dispatch: resolves the partition plan, installs one job
/// on the pool, and hands back a handle whose parts merge in worker-index
/// order. With a disabled pool the scan runs inline instead.
fn parallel_scan<T, F>(
    store: &Arc<Store>,
    pool: &ScanPool,
    merge: fn(Vec<T>) -> T,
    per_slot: F,
) -> Result<TaskHandle<T>>
where
    T: Default + Send + 'static,
    F: Fn(u64, &[u8], &CancelToken, &mut T) -> Result<()> + Send + Sync + 'static,
{
    let token = CancelToken::new();
    let guard = store.read_guard();
    let slots = store.slot_count();
    let header_size = store.schema().header_size();
    let slot_size = store.schema().slot_size();

    let workers = pool.workers();
    if workers == 0 {
        let mut acc = T::default();
        let result = scan_range(store.path(), header_size, slot_size, 0, slots, &token, |id, slot| {
            per_slot(id, slot, &token, &mut acc)
        })
        .map(|()| acc);
        drop(guard);
        return Ok(TaskHandle::ready(result, token));
    }

    let plan = partition(slots, workers as u64);
    let parts: Arc<Mutex<Vec<Option<Result<T>>>>> =
        Arc::new(Mutex::new((0..workers).map(|_| None).collect()));

    let task = {
        let parts = Arc::clone(&parts);
        let token = token.clone();
        let path = store.path().to_path_buf();
        move |index: usize| {
            let (start, count) = plan[index];
            let mut acc = T::default();
            let result = scan_range(&path, header_size, slot_size, start, count, &token, |id, slot| {
                per_slot(id, slot, &token, &mut acc)
            })
            .map(|()| acc);
            parts.lock()[index] = Some(result);
        }
    };

    let job = pool.submit(Box::new(task), Box::new(guard));
    Ok(TaskHandle::pending(job, parts, merge, token))
}

/// Contiguous per-worker slot ranges: `base = n / t` each, remainder to the
/// last worker.
fn partition(slots: u64, workers: u64) -> Vec<(u64, u64)> {
    let base = slots / workers;
    (0..workers)
        .map(|index| {
            let start = base * index;
            let count = if index == workers - 1 {
                slots - start
            } else {
                base
            };
            (start, count)
        })
        .collect()
}

fn concat<T>(parts: Vec<Vec<T>>) -> Vec<T> {
    parts.into_iter().flatten().collect()
}

fn sum(parts: Vec<u64>) -> u64 {
    parts.into_iter().sum()
}
