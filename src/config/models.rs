use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `LOG_NOTICE | LOG_LOCAL2`
pub const DEFAULT_SYSLOG_PRIORITY: u8 = 5 | (18 << 3);

/// Highest valid syslog priority (`LOG_LOCAL7 | LOG_DEBUG`)
pub const MAX_SYSLOG_PRIORITY: u8 = 191;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub forward: ForwardConfig,
}

/// Active file, rotation and retention settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    /// Rotate once the active file holds at least this many bytes
    #[serde(default = "default_max_size")]
    pub max_size: ByteSize,
    /// Archives kept per base name after each maintenance pass
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Gzip archives before retention runs
    #[serde(default = "default_compress")]
    pub compress: bool,
    /// Capacity of the rotation-to-maintenance handoff
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            max_size: default_max_size(),
            max_files: default_max_files(),
            compress: default_compress(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("./output.log")
}

fn default_max_size() -> ByteSize {
    ByteSize::mebibytes(10)
}

fn default_max_files() -> usize {
    5
}

fn default_compress() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    100
}

/// Syslog forwarding of matching lines
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForwardConfig {
    /// `host:port` of a syslog server reachable over UDP
    pub target: Option<String>,
    /// Only lines matching this regex are forwarded; all lines when unset
    pub pattern: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default = "default_tag")]
    pub tag: String,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            target: None,
            pattern: None,
            priority: default_priority(),
            tag: default_tag(),
        }
    }
}

fn default_priority() -> u8 {
    DEFAULT_SYSLOG_PRIORITY
}

fn default_tag() -> String {
    "stdin-rotate".to_string()
}
