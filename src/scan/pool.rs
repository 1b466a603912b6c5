//! # Scan Worker Pool
//!
//! Fixed-size pool of worker threads that execute exactly one scan action at
//! a time. The facade installs a [`Job`] and wakes every worker; worker `i`
//! runs the job's task with its own index (which selects its partition) and
//! the last worker to finish clears the job slot, releases the job's
//! keepalive (the scan's read guard) and signals both the job's waiters and
//! the next submitter.
//!
//! ## Coordination
//!
//! ```text
//! submit ──install job, bump generation──> wake.notify_all
//! worker ──wait(generation changed)──> task(index) ──last one──> idle.notify_all
//! ```
//!
//! The job and its result slots are published under the state mutex before
//! the wake, which gives workers the happens-before edge they need to see
//! the installed action. A generation counter distinguishes "job still
//! present because other workers are running" from "new job to pick up", so
//! a fast worker cannot run the same action twice.
//!
//! A pool of zero workers is valid: the engine then runs nominally parallel
//! scans inline on the calling thread.

use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// One dispatched scan action.
pub(crate) struct Job {
    task: Box<dyn Fn(usize) + Send + Sync>,
    pending: AtomicUsize,
    done: Mutex<bool>,
    done_cv: Condvar,
    /// Dropped by the last finishing worker; carries the scan's read guard.
    keepalive: Mutex<Option<Box<dyn Any + Send>>>,
}

impl Job {
    /// Blocks until every worker has finished this job.
    pub(crate) fn wait(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.done_cv.wait(&mut done);
        }
    }

    fn finish(&self) {
        let mut done = self.done.lock();
        *done = true;
        drop(done);
        self.done_cv.notify_all();
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("pending", &self.pending.load(Ordering::Relaxed))
            .finish()
    }
}

#[derive(Default)]
struct PoolState {
    job: Option<Arc<Job>>,
    generation: u64,
    shutdown: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    /// Workers sleep here between actions.
    wake: Condvar,
    /// Submitters sleep here while an action is in flight.
    idle: Condvar,
}

/// Fixed worker pool executing one scan action at a time.
pub struct ScanPool {
    shared: Arc<PoolShared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    workers: usize,
}

impl ScanPool {
    /// Spawns `workers` threads. Zero workers disables parallel execution.
    pub fn new(workers: usize) -> Self {
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState::default()),
            wake: Condvar::new(),
            idle: Condvar::new(),
        });

        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let shared = Arc::clone(&shared);
            let handle = std::thread::Builder::new()
                .name(format!("fuziot-scan-{index}"))
                .spawn(move || worker_main(shared, index))
                .expect("failed to spawn scan worker");
            handles.push(handle);
        }
        tracing::debug!(workers, "scan pool started");

        Self {
            shared,
            handles: Mutex::new(handles),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Installs the next action once any in-flight action has fully drained,
    /// then wakes the workers. `keepalive` is dropped by the last worker to
    /// finish.
    pub(crate) fn submit(
        &self,
        task: Box<dyn Fn(usize) + Send + Sync>,
        keepalive: Box<dyn Any + Send>,
    ) -> Arc<Job> {
        debug_assert!(self.workers > 0, "submit on a disabled pool");
        let job = Arc::new(Job {
            task,
            pending: AtomicUsize::new(self.workers),
            done: Mutex::new(false),
            done_cv: Condvar::new(),
            keepalive: Mutex::new(Some(keepalive)),
        });

        let mut state = self.shared.state.lock();
        while state.job.is_some() {
            self.shared.idle.wait(&mut state);
        }
        state.job = Some(Arc::clone(&job));
        state.generation += 1;
        drop(state);
        self.shared.wake.notify_all();
        job
    }

    /// Waits for any in-flight action, then stops and joins every worker.
    /// Idempotent.
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            while state.job.is_some() {
                self.shared.idle.wait(&mut state);
            }
            state.shutdown = true;
        }
        self.shared.wake.notify_all();

        let handles = std::mem::take(&mut *self.handles.lock());
        let joined = handles.len();
        for handle in handles {
            let _ = handle.join();
        }
        if joined > 0 {
            tracing::debug!(workers = joined, "scan pool shut down");
        }
    }
}

impl Drop for ScanPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_main(shared: Arc<PoolShared>, index: usize) {
    let mut last_generation = 0u64;
    loop {
        let job = {
            let mut state = shared.state.lock();
            loop {
                if state.shutdown {
                    return;
                }
                if state.generation != last_generation {
                    if let Some(job) = &state.job {
                        last_generation = state.generation;
                        break Arc::clone(job);
                    }
                }
                shared.wake.wait(&mut state);
            }
        };

        (job.task)(index);

        if job.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            shared.state.lock().job = None;
            job.keepalive.lock().take();
            job.finish();
            shared.idle.notify_all();
        }
    }
}
