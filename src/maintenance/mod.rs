//! Background maintenance of rotated archives
//!
//! Rotation hands each new archive to a bounded [`ArchiveQueue`]. A single
//! [`MaintenanceWorker`] drains it in order, gzipping each archive and then
//! pruning the directory so at most `max_files` archives remain.
//! [`PendingWork`] counts archives that are queued but not yet done and is
//! what shutdown waits on.
//!
//! ```text
//! rotate() ──enqueue──► [ bounded queue ] ──recv──► worker
//!    │                                                 │ compress (spawn_blocking)
//!    └── pending += 1                                  │ prune    (spawn_blocking)
//!                                                      └── pending -= 1
//! ```
//!
//! Listing, deletion and compression failures are fatal: the worker stops
//! and the error is surfaced to the process.

pub mod compress;
pub mod error;
pub mod queue;
pub mod retention;
pub mod worker;

pub use error::{MaintenanceError, Result};
pub use queue::{ArchiveQueue, ArchiveReceiver, PendingWork, archive_queue};
pub use worker::{MaintenanceWorker, PassOutcome};
