//! Wires configuration, the appender, maintenance and forwarding into one
//! ingestion run over a line-oriented input.

use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

use crate::appender::{AppendError, Appender};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::forward::Forwarder;
use crate::maintenance::{MaintenanceError, MaintenanceWorker, archive_queue};
use crate::observability::{Metrics, MetricsSnapshot};
use crate::shutdown::ShutdownCoordinator;

/// Read `input` line by line into the rotating output until end of input,
/// a termination signal from `shutdown`, or a fatal error.
///
/// Every exit path drains: the active file is closed and all archives
/// rotated so far are compressed and pruned before this returns. The
/// signal only interrupts a pending read, never a line being written.
pub async fn run<R, S>(config: Config, mut input: R, shutdown: S) -> Result<MetricsSnapshot>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = io::Result<&'static str>>,
{
    config.validate()?;

    let metrics = Arc::new(Metrics::new());
    let forwarder = Forwarder::connect(&config.forward).await?;
    if forwarder.is_enabled() {
        info!(forwarder = ?forwarder, "Forwarding enabled");
    }

    let (queue, receiver) = archive_queue(config.output.queue_capacity);
    let pending = queue.pending();
    let appender = Arc::new(Appender::open(
        &config.output,
        queue,
        forwarder,
        metrics.clone(),
    )?);
    let mut worker = MaintenanceWorker::new(&config.output, receiver, metrics.clone()).spawn();
    let coordinator = ShutdownCoordinator::new(appender.clone(), pending);

    tokio::pin!(shutdown);
    let mut worker_result = None;
    let mut buf = Vec::with_capacity(4096);

    let ingested: Result<()> = loop {
        buf.clear();

        let read = tokio::select! {
            biased;
            signal = &mut shutdown => {
                match signal {
                    Ok(name) => {
                        info!(signal = name, "Termination signal received, draining");
                        break Ok(());
                    }
                    Err(e) => break Err(Error::Signal(e)),
                }
            }
            joined = &mut worker => {
                worker_result = Some(joined);
                break Ok(());
            }
            read = input.read_until(b'\n', &mut buf) => read,
        };

        match read {
            Ok(0) => {
                info!("End of input, draining");
                break Ok(());
            }
            Ok(_) => match appender.append(trim_line_ending(&buf)).await {
                Ok(()) => {}
                Err(AppendError::Closed) => break Ok(()),
                Err(e) => break Err(e.into()),
            },
            Err(e) => break Err(Error::Input(e)),
        }
    };

    let drained = coordinator.drain().await;
    let joined = match worker_result {
        Some(joined) => joined,
        None => worker.await,
    };
    let maintained = joined.map_err(MaintenanceError::from).and_then(|r| r);

    // A dead worker also surfaces as a closed queue or an aborted drain,
    // so report its own error first
    maintained?;
    ingested?;
    drained?;

    let snapshot = metrics.snapshot();
    info!(
        lines = snapshot.lines_written,
        bytes = snapshot.bytes_written,
        rotations = snapshot.rotations,
        compressed = snapshot.archives_compressed,
        pruned = snapshot.archives_pruned,
        forwarded = snapshot.lines_forwarded,
        forward_failures = snapshot.forward_failures,
        "Ingestion finished"
    );
    Ok(snapshot)
}

/// Drop the trailing `\n` and a preceding `\r`, if present
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
