use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppendError {
    #[error("cannot open file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot stat file {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("write to {} failed: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot close {}: {source}", path.display())]
    Close {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot rename {} to {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot format archive timestamp: {0}")]
    Timestamp(#[from] time::error::Format),

    #[error("cannot scan existing archives: {0}")]
    Scan(#[from] crate::maintenance::MaintenanceError),

    #[error("file task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("archive queue is closed, maintenance worker has stopped")]
    QueueClosed,

    #[error("appender is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, AppendError>;
