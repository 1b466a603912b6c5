//! Builder for [`Database`]: the directory the record files live in and the
//! size of the scan worker pool.

use super::Database;
use crate::error::Result;
use crate::scan::ScanPool;
use std::path::PathBuf;

/// Configures and opens a [`Database`].
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    path: Option<PathBuf>,
    worker_threads: Option<usize>,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding the record files. Created on open if missing.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Number of scan worker threads. Defaults to the logical core count;
    /// zero disables parallel scans (nominally parallel calls run inline).
    pub fn worker_threads(mut self, workers: usize) -> Self {
        self.worker_threads = Some(workers);
        self
    }

    pub fn open(self) -> Result<Database> {
        let dir = self.path.ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "database path is required",
            )
        })?;
        std::fs::create_dir_all(&dir)?;

        let workers = self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        tracing::debug!(dir = %dir.display(), workers, "opening database");
        Ok(Database::with_pool(dir, ScanPool::new(workers)))
    }
}
