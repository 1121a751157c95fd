//! In-process counters for the write path and the maintenance pipeline

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle shared by the appender, the maintenance worker and the forwarder
#[derive(Debug, Default)]
pub struct Metrics {
    lines_written: AtomicU64,
    bytes_written: AtomicU64,
    rotations: AtomicU64,
    archives_compressed: AtomicU64,
    archives_pruned: AtomicU64,
    lines_forwarded: AtomicU64,
    forward_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line_written(&self, bytes: u64) {
        self.lines_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn rotated(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "rotations", "Metric incremented");
    }

    pub fn archive_compressed(&self) {
        self.archives_compressed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "archives_compressed", "Metric incremented");
    }

    pub fn archives_pruned(&self, count: u64) {
        self.archives_pruned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn line_forwarded(&self) {
        self.lines_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn forward_failed(&self) {
        self.forward_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "forward_failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_written: self.lines_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            archives_compressed: self.archives_compressed.load(Ordering::Relaxed),
            archives_pruned: self.archives_pruned.load(Ordering::Relaxed),
            lines_forwarded: self.lines_forwarded.load(Ordering::Relaxed),
            forward_failures: self.forward_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub lines_written: u64,
    pub bytes_written: u64,
    pub rotations: u64,
    pub archives_compressed: u64,
    pub archives_pruned: u64,
    pub lines_forwarded: u64,
    pub forward_failures: u64,
}
