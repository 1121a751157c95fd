use thiserror::Error;

use crate::appender::AppendError;
use crate::config::ConfigError;
use crate::forward::ForwardError;
use crate::maintenance::MaintenanceError;

/// Any condition that ends the process with a non-zero status
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("append failed: {0}")]
    Append(#[from] AppendError),

    #[error("maintenance failed: {0}")]
    Maintenance(#[from] MaintenanceError),

    #[error("forwarding setup failed: {0}")]
    Forward(#[from] ForwardError),

    #[error("cannot read input: {0}")]
    Input(#[source] std::io::Error),

    #[error("cannot listen for termination signals: {0}")]
    Signal(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
