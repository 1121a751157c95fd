//! Orderly shutdown on SIGINT/SIGTERM or end of input

use std::io;
use std::sync::Arc;

use tracing::info;

use crate::appender::Appender;
use crate::error::Result;
use crate::maintenance::PendingWork;

/// Resolves with the signal's name once SIGINT or SIGTERM arrives
pub async fn termination_signal() -> io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = interrupt.recv() => Ok("SIGINT"),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok("ctrl-c")
    }
}

/// Drains the appender and the maintenance pipeline.
///
/// Used for both exits: a termination signal and a clean end of input.
pub struct ShutdownCoordinator {
    appender: Arc<Appender>,
    pending: Arc<PendingWork>,
}

impl ShutdownCoordinator {
    pub fn new(appender: Arc<Appender>, pending: Arc<PendingWork>) -> Self {
        Self { appender, pending }
    }

    /// Stop ingestion, close the active file, then wait until every archive
    /// queued so far has been compressed and pruned.
    pub async fn drain(&self) -> Result<()> {
        self.appender.close().await?;

        let outstanding = self.pending.outstanding();
        if outstanding > 0 {
            info!(outstanding, "Waiting for archive maintenance");
        }
        self.pending.wait_idle().await?;

        self.appender.mark_terminated();
        info!("Shutdown drain complete");
        Ok(())
    }
}
