//! # Scan Engine
//!
//! Full-file linear scans over one record type, in three shapes:
//!
//! - **fetch** — decode a requested projection of fields per live slot and
//!   collect the rows the predicate accepts;
//! - **fetch-full** — materialize every field into a [`Record`](crate::types::Record)
//!   and collect the matches;
//! - **count** — only count the matches.
//!
//! Each shape runs single-threaded on the caller, or partitioned across the
//! worker pool. Parallel scans split the slot range into one contiguous
//! partition per worker; each worker opens its own file handle, scans its
//! partition, and deposits its part into an index-addressed result slot.
//! Parts are merged in worker-index order, so parallel fetch results are not
//! in file order unless the pool has a single worker.
//!
//! ## Cancellation
//!
//! Every scan carries a [`CancelToken`] that the predicate (and, for
//! parallel scans, the [`TaskHandle`]) may set. The flag is checked between
//! slots; a worker that has begun decoding a slot finishes it, and other
//! workers observe the flag best-effort. Results gathered before the
//! cancellation are kept.

mod cancel;
pub(crate) mod engine;
mod handle;
mod pool;
mod projection;

pub use cancel::CancelToken;
pub use handle::TaskHandle;
pub use pool::ScanPool;
pub(crate) use projection::Projection;
