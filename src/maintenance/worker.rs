use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::compress::compress_archive;
use super::error::Result;
use super::queue::ArchiveReceiver;
use super::retention;
use crate::config::OutputConfig;
use crate::observability::Metrics;

/// What one maintenance pass did
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PassOutcome {
    pub compressed: Option<PathBuf>,
    pub pruned: Vec<PathBuf>,
}

/// Single background consumer of rotated archives.
///
/// For each archive, in rotation order: gzip it (when enabled), then prune
/// the directory down to `max_files` archives. The first failure stops the
/// worker and marks pending work as failed so shutdown does not wait forever.
pub struct MaintenanceWorker {
    active_path: PathBuf,
    compress: bool,
    max_files: usize,
    receiver: ArchiveReceiver,
    metrics: Arc<Metrics>,
}

impl MaintenanceWorker {
    pub fn new(output: &OutputConfig, receiver: ArchiveReceiver, metrics: Arc<Metrics>) -> Self {
        Self {
            active_path: output.path.clone(),
            compress: output.compress,
            max_files: output.max_files,
            receiver,
            metrics,
        }
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    /// Process archives until the queue is closed and empty
    pub async fn run(mut self) -> Result<()> {
        info!(
            compress = self.compress,
            max_files = self.max_files,
            "Maintenance worker started"
        );

        while let Some(archive) = self.receiver.recv().await {
            match self.process(archive).await {
                Ok(outcome) => {
                    if outcome.compressed.is_some() {
                        self.metrics.archive_compressed();
                    }
                    self.metrics.archives_pruned(outcome.pruned.len() as u64);
                    self.receiver.pending().finish();
                }
                Err(e) => {
                    error!(error = %e, "Maintenance failed");
                    self.receiver.pending().fail();
                    return Err(e);
                }
            }
        }

        info!("Maintenance worker finished");
        Ok(())
    }

    /// One maintenance pass over a freshly rotated archive
    async fn process(&self, archive: PathBuf) -> Result<PassOutcome> {
        debug!(path = %archive.display(), "Maintaining archive");

        let active_path = self.active_path.clone();
        let compress = self.compress;
        let max_files = self.max_files;

        tokio::task::spawn_blocking(move || -> Result<PassOutcome> {
            let compressed = if compress {
                compress_archive(&archive)?
            } else {
                None
            };
            let pruned = retention::enforce(&active_path, max_files)?;
            Ok(PassOutcome { compressed, pruned })
        })
        .await?
    }
}
