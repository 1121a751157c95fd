use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::{Notify, mpsc};
use tracing::debug;

use super::error::{MaintenanceError, Result};

/// Count of archives handed to maintenance and not yet finished.
///
/// Zero means no maintenance work is outstanding. The shutdown path blocks
/// on [`PendingWork::wait_idle`] until that holds.
#[derive(Debug, Default)]
pub struct PendingWork {
    count: AtomicUsize,
    failed: AtomicBool,
    notify: Notify,
}

impl PendingWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outstanding(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    pub(crate) fn begin(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn finish(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.notify.notify_waiters();
        }
    }

    /// Mark maintenance as dead so waiters stop waiting for it
    pub(crate) fn fail(&self) {
        self.failed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Wait until every enqueued archive has been compressed and pruned
    pub async fn wait_idle(&self) -> Result<()> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a wakeup between check and await is not lost
            notified.as_mut().enable();

            if self.has_failed() {
                return Err(MaintenanceError::Aborted);
            }
            if self.outstanding() == 0 {
                return Ok(());
            }

            notified.await;
        }
    }
}

/// Sending half of the rotation-to-maintenance handoff
///
/// Bounded: when the worker falls `capacity` archives behind, rotation
/// waits for it instead of buffering without limit.
#[derive(Debug, Clone)]
pub struct ArchiveQueue {
    sender: mpsc::Sender<PathBuf>,
    pending: Arc<PendingWork>,
}

/// Receiving half, owned by the maintenance worker
#[derive(Debug)]
pub struct ArchiveReceiver {
    receiver: mpsc::Receiver<PathBuf>,
    pending: Arc<PendingWork>,
}

/// Create a queue holding at most `capacity` archives in flight
pub fn archive_queue(capacity: usize) -> (ArchiveQueue, ArchiveReceiver) {
    let (sender, receiver) = mpsc::channel(capacity);
    let pending = Arc::new(PendingWork::new());

    (
        ArchiveQueue {
            sender,
            pending: pending.clone(),
        },
        ArchiveReceiver { receiver, pending },
    )
}

impl ArchiveQueue {
    /// Hand an archive to maintenance, waiting for room if the queue is full.
    ///
    /// Waiting happens before anything is counted, so dropping this future
    /// leaves the pending count untouched. Gives the path back if the
    /// worker has stopped.
    pub async fn enqueue(&self, archive: PathBuf) -> std::result::Result<(), PathBuf> {
        let Ok(permit) = self.sender.reserve().await else {
            return Err(archive);
        };

        self.pending.begin();
        permit.send(archive);
        debug!(pending = self.pending.outstanding(), "Archive enqueued");
        Ok(())
    }

    pub fn pending(&self) -> Arc<PendingWork> {
        self.pending.clone()
    }
}

impl ArchiveReceiver {
    /// Next archive in rotation order; `None` once every sender is gone and
    /// the queue is empty
    pub async fn recv(&mut self) -> Option<PathBuf> {
        self.receiver.recv().await
    }

    pub fn pending(&self) -> &Arc<PendingWork> {
        &self.pending
    }
}
