//! Capture a line stream into a size-rotated log file.
//!
//! Lines are appended to an active file. Once it reaches the configured
//! size it is renamed to a timestamped archive and a background worker
//! gzips the archive and prunes the oldest ones. Matching lines can
//! optionally be mirrored to a syslog collector over UDP.

pub mod appender;
pub mod archive;
pub mod config;
pub mod error;
pub mod forward;
pub mod humanize;
pub mod maintenance;
pub mod observability;
pub mod service;
pub mod shutdown;

pub use appender::{Appender, AppenderState};
pub use config::{Config, Overrides};
pub use error::{Error, Result};
pub use observability::{Metrics, MetricsSnapshot};
pub use service::run;
