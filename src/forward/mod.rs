//! Best-effort mirroring of ingested lines to an external sink
//!
//! The forwarder is chosen once at startup from [`ForwardConfig`] and never
//! affects persistence: send failures are counted and logged, nothing more.

pub mod syslog;

use std::io;

use async_trait::async_trait;
use regex::bytes::Regex;
use thiserror::Error;
use tracing::warn;

use crate::config::ForwardConfig;
use crate::observability::Metrics;
pub use syslog::SyslogSink;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("cannot resolve forward target '{target}': {source}")]
    Resolve { target: String, source: io::Error },

    #[error("forward target '{0}' resolved to no addresses")]
    NoAddress(String),

    #[error("cannot open socket to '{target}': {source}")]
    Socket { target: String, source: io::Error },

    #[error("invalid forward pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Destination for forwarded lines
#[async_trait]
pub trait LineSink: Send + Sync {
    async fn send(&self, line: &[u8]) -> io::Result<()>;
}

pub enum Forwarder {
    Disabled,
    /// Every line is forwarded
    Unconditional(Box<dyn LineSink>),
    /// Only lines matching `pattern` are forwarded
    Filtered {
        sink: Box<dyn LineSink>,
        pattern: Regex,
    },
}

impl Forwarder {
    /// Build the forwarder described by `config`, connecting its sink.
    ///
    /// Without a target the forwarder is disabled, whatever else is set.
    pub async fn connect(config: &ForwardConfig) -> Result<Self, ForwardError> {
        let Some(target) = &config.target else {
            return Ok(Forwarder::Disabled);
        };

        let sink = SyslogSink::connect(target, config.priority, &config.tag).await?;
        Self::with_sink(Box::new(sink), config.pattern.as_deref())
    }

    pub fn with_sink(sink: Box<dyn LineSink>, pattern: Option<&str>) -> Result<Self, ForwardError> {
        Ok(match pattern {
            Some(pattern) => Forwarder::Filtered {
                sink,
                pattern: Regex::new(pattern)?,
            },
            None => Forwarder::Unconditional(sink),
        })
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Forwarder::Disabled)
    }

    fn sink_for(&self, line: &[u8]) -> Option<&dyn LineSink> {
        match self {
            Forwarder::Disabled => None,
            Forwarder::Unconditional(sink) => Some(sink.as_ref()),
            Forwarder::Filtered { sink, pattern } => {
                pattern.is_match(line).then_some(sink.as_ref())
            }
        }
    }

    /// Forward `line` if this forwarder wants it; never fails
    pub async fn forward(&self, line: &[u8], metrics: &Metrics) {
        let Some(sink) = self.sink_for(line) else {
            return;
        };

        match sink.send(line).await {
            Ok(()) => metrics.line_forwarded(),
            Err(e) => {
                metrics.forward_failed();
                warn!(error = %e, "Forwarding failed, line kept on disk only");
            }
        }
    }
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Forwarder::Disabled => f.write_str("Disabled"),
            Forwarder::Unconditional(_) => f.write_str("Unconditional"),
            Forwarder::Filtered { pattern, .. } => f
                .debug_struct("Filtered")
                .field("pattern", &pattern.as_str())
                .finish(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records forwarded lines; optionally fails every send
    #[derive(Clone, Default)]
    pub(crate) struct RecordingSink {
        pub(crate) lines: Arc<Mutex<Vec<Vec<u8>>>>,
        pub(crate) fail: bool,
    }

    #[async_trait]
    impl LineSink for RecordingSink {
        async fn send(&self, line: &[u8]) -> io::Result<()> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
            }
            self.lines.lock().unwrap().push(line.to_vec());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_disabled_without_target() {
        let config = ForwardConfig {
            pattern: Some("ERROR".to_string()),
            ..ForwardConfig::default()
        };
        let forwarder = Forwarder::connect(&config).await.unwrap();
        assert!(!forwarder.is_enabled());
    }

    #[tokio::test]
    async fn test_unconditional_forwards_everything() {
        let sink = RecordingSink::default();
        let forwarder = Forwarder::with_sink(Box::new(sink.clone()), None).unwrap();
        let metrics = Metrics::new();

        forwarder.forward(b"one", &metrics).await;
        forwarder.forward(b"two", &metrics).await;

        assert_eq!(*sink.lines.lock().unwrap(), vec![b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(metrics.snapshot().lines_forwarded, 2);
    }

    #[tokio::test]
    async fn test_filtered_forwards_matches_only() {
        let sink = RecordingSink::default();
        let forwarder = Forwarder::with_sink(Box::new(sink.clone()), Some(r"^(WARN|ERROR)\b")).unwrap();
        let metrics = Metrics::new();

        for line in [&b"INFO ok"[..], b"ERROR boom", b"WARN slow", b"DEBUG ERROR"] {
            forwarder.forward(line, &metrics).await;
        }

        assert_eq!(
            *sink.lines.lock().unwrap(),
            vec![b"ERROR boom".to_vec(), b"WARN slow".to_vec()]
        );
    }

    #[tokio::test]
    async fn test_filter_handles_invalid_utf8() {
        let sink = RecordingSink::default();
        let forwarder = Forwarder::with_sink(Box::new(sink.clone()), Some("panic")).unwrap();

        forwarder.forward(b"\xff\xfe panic", &Metrics::new()).await;
        assert_eq!(sink.lines.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_send_failure_is_swallowed() {
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let forwarder = Forwarder::with_sink(Box::new(sink), None).unwrap();
        let metrics = Metrics::new();

        forwarder.forward(b"lost", &metrics).await;
        assert_eq!(metrics.snapshot().forward_failures, 1);
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let result = Forwarder::with_sink(Box::new(RecordingSink::default()), Some("("));
        assert!(matches!(result, Err(ForwardError::Pattern(_))));
    }
}
