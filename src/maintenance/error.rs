use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("cannot list archive directory {}: {source}", dir.display())]
    ListDir {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot compress {}: {source}", path.display())]
    Compress {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("maintenance task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("maintenance worker stopped after a fatal error")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, MaintenanceError>;
