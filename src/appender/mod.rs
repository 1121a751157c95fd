//! Rotation engine
//!
//! [`Appender`] owns the active file and decides, before every line, whether
//! the file has reached `max_size`. If so it rotates synchronously on the
//! ingestion path:
//!
//! 1. flush, sync and close the active file
//! 2. rename it to `<path>_<timestamp>` (never an existing name)
//! 3. reopen `<path>` in append mode and resync the byte counter
//! 4. hand the archive to maintenance, waiting if the queue is full
//!
//! A line is never split across files, so a file may end up larger than
//! `max_size` by at most one line.
//!
//! The appender is shared between the ingestion loop and the shutdown path.
//! The file sits behind an async mutex, and the lifecycle state is atomic so
//! ingestion can see `Closing` without taking the lock.

mod active;
mod error;

pub use active::ActiveFile;
pub use error::{AppendError, Result};

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::archive::ArchiveNamer;
use crate::config::OutputConfig;
use crate::forward::Forwarder;
use crate::maintenance::{ArchiveQueue, retention};
use crate::observability::Metrics;

/// Lifecycle of an [`Appender`]
///
/// `Running ⇄ Rotating` on every rotation, then `Running → Closing →
/// Terminated` once. `Closing` is irreversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AppenderState {
    Running = 0,
    Rotating = 1,
    Closing = 2,
    Terminated = 3,
}

impl AppenderState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => AppenderState::Running,
            1 => AppenderState::Rotating,
            2 => AppenderState::Closing,
            _ => AppenderState::Terminated,
        }
    }
}

struct Inner {
    active: Option<ActiveFile>,
    namer: ArchiveNamer,
    queue: Option<ArchiveQueue>,
}

pub struct Appender {
    inner: Mutex<Inner>,
    state: AtomicU8,
    max_size: u64,
    forwarder: Forwarder,
    metrics: Arc<Metrics>,
}

impl Appender {
    /// Open the active file at `output.path`; failure here is fatal to startup
    pub fn open(
        output: &OutputConfig,
        queue: ArchiveQueue,
        forwarder: Forwarder,
        metrics: Arc<Metrics>,
    ) -> Result<Self> {
        let active = ActiveFile::open(&output.path)?;
        let existing = retention::list_archives(&output.path)?;
        info!(
            path = %output.path.display(),
            bytes = active.bytes_written(),
            max_size = %output.max_size,
            archives = existing.len(),
            "Active file opened"
        );

        Ok(Self {
            inner: Mutex::new(Inner {
                active: Some(active),
                namer: ArchiveNamer::resume(&output.path, &existing),
                queue: Some(queue),
            }),
            state: AtomicU8::new(AppenderState::Running as u8),
            max_size: output.max_size.as_u64(),
            forwarder,
            metrics,
        })
    }

    pub fn state(&self) -> AppenderState {
        AppenderState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// True once shutdown has begun; the ingestion loop stops reading
    pub fn is_closed(&self) -> bool {
        matches!(
            self.state(),
            AppenderState::Closing | AppenderState::Terminated
        )
    }

    /// Bytes in the current active file, `None` once closed
    pub async fn bytes_written(&self) -> Option<u64> {
        self.inner
            .lock()
            .await
            .active
            .as_ref()
            .map(ActiveFile::bytes_written)
    }

    /// Append `line` and a newline, rotating first if the active file has
    /// reached `max_size`. Forwarding happens after the line is on disk.
    pub async fn append(&self, line: &[u8]) -> Result<()> {
        if self.is_closed() {
            return Err(AppendError::Closed);
        }

        {
            let mut inner = self.inner.lock().await;
            // Closing may have started while we waited for the lock
            if self.is_closed() {
                return Err(AppendError::Closed);
            }

            let needs_rotation = inner
                .active
                .as_ref()
                .is_some_and(|active| active.bytes_written() >= self.max_size);
            if needs_rotation {
                self.rotate(&mut inner).await?;
            }

            let active = inner.active.as_mut().ok_or(AppendError::Closed)?;
            let written = active.write_line(line)?;
            self.metrics.line_written(written);
        }

        self.forwarder.forward(line, &self.metrics).await;
        Ok(())
    }

    async fn rotate(&self, inner: &mut Inner) -> Result<()> {
        let _ = self.state.compare_exchange(
            AppenderState::Running as u8,
            AppenderState::Rotating as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );

        let result = self.rotate_locked(inner).await;

        let _ = self.state.compare_exchange(
            AppenderState::Rotating as u8,
            AppenderState::Running as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        result
    }

    async fn rotate_locked(&self, inner: &mut Inner) -> Result<()> {
        let archive = inner.namer.next_path(OffsetDateTime::now_utc())?;
        let Some(active) = inner.active.take() else {
            return Err(AppendError::Closed);
        };
        let path = active.path().to_path_buf();
        let size = active.bytes_written();

        let (reopened, moved) = blocking({
            let path = path.clone();
            let archive = archive.clone();
            move || {
                active.close()?;
                let moved = rename(&path, &archive)?;
                Ok((ActiveFile::open(&path)?, moved))
            }
        })
        .await?;
        inner.active = Some(reopened);

        if !moved {
            warn!(
                path = %path.display(),
                "Active file was moved away by another process, reopened without archiving"
            );
            return Ok(());
        }

        self.metrics.rotated();
        info!(archive = %archive.display(), bytes = size, "Rotated active file");

        let queue = inner.queue.as_ref().ok_or(AppendError::Closed)?;
        queue
            .enqueue(archive)
            .await
            .map_err(|_| AppendError::QueueClosed)
    }

    /// Stop accepting lines, then flush and close the active file.
    ///
    /// Safe to call more than once and from any task: only the first call
    /// touches the file. Also drops the queue sender, so the maintenance
    /// worker exits once it has drained what is already queued.
    pub async fn close(&self) -> Result<bool> {
        let _ = self.state.fetch_max(AppenderState::Closing as u8, Ordering::AcqRel);

        let mut inner = self.inner.lock().await;
        inner.queue.take();

        let Some(active) = inner.active.take() else {
            debug!("Active file already closed");
            return Ok(false);
        };

        let path = active.path().to_path_buf();
        blocking(move || active.close()).await?;
        info!(path = %path.display(), "Active file closed");
        Ok(true)
    }

    /// Record that shutdown has finished draining maintenance
    pub fn mark_terminated(&self) {
        self.state
            .store(AppenderState::Terminated as u8, Ordering::Release);
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}

/// Run file-system work that may block (fsync, rename) off the async workers
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// Rename the active file to its archive name; `false` if it no longer exists
fn rename(from: &Path, to: &Path) -> Result<bool> {
    match fs::rename(from, to) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(AppendError::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }),
    }
}
