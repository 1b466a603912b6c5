//! # Per-Type Reader/Writer Lock
//!
//! Each record type has an independent lock with the classic single-writer,
//! many-reader discipline:
//!
//! - a reader blocks while a writer holds or is acquiring the lock, then
//!   increments the reader count;
//! - a writer blocks while another writer is active, claims the writer flag,
//!   then blocks until the reader count drains to zero. New readers cannot
//!   enter during the drain.
//!
//! The state lives behind a `parking_lot::Mutex` with a `Condvar` for
//! wake-ups, so waiting threads park instead of spinning. Guards are tied to
//! an `Arc` of the lock rather than a borrow so a scan handle can carry its
//! read guard across threads; the last scan worker drops it when the file is
//! no longer being read.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

#[derive(Debug, Default)]
struct LockState {
    readers: usize,
    writing: bool,
}

/// Reader/writer lock shared by every operation on one record type.
#[derive(Debug, Default)]
pub struct TypeLock {
    state: Mutex<LockState>,
    cond: Condvar,
}

impl TypeLock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Blocks until no writer is active, then registers a reader.
    pub fn read(self: &Arc<Self>) -> ReadGuard {
        let mut state = self.state.lock();
        while state.writing {
            self.cond.wait(&mut state);
        }
        state.readers += 1;
        drop(state);
        ReadGuard {
            lock: Arc::clone(self),
        }
    }

    /// Blocks until no other writer is active, claims the writer flag, then
    /// waits for the readers to drain.
    pub fn write(self: &Arc<Self>) -> WriteGuard {
        let mut state = self.state.lock();
        while state.writing {
            self.cond.wait(&mut state);
        }
        state.writing = true;
        while state.readers > 0 {
            self.cond.wait(&mut state);
        }
        drop(state);
        WriteGuard {
            lock: Arc::clone(self),
        }
    }
}

/// Releases one reader on drop.
#[derive(Debug)]
pub struct ReadGuard {
    lock: Arc<TypeLock>,
}

impl Drop for ReadGuard {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock();
        state.readers -= 1;
        if state.readers == 0 {
            self.lock.cond.notify_all();
        }
    }
}

/// Releases the writer flag on drop.
#[derive(Debug)]
pub struct WriteGuard {
    lock: Arc<TypeLock>,
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock();
        state.writing = false;
        drop(state);
        self.lock.cond.notify_all();
    }
}
