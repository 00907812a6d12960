// Scan metrics module
//
// Lightweight counters for a triage run, logged once the batch completes

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters for one triage run.
///
/// Uses atomics so the batch driver can record through a shared reference.
#[derive(Debug)]
pub struct ScanMetrics {
    /// Archives processed, readable or not
    pub archives_scanned: AtomicUsize,

    pub archives_kept: AtomicUsize,

    pub archives_excluded: AtomicUsize,

    /// Archives that could not be opened
    pub open_failures: AtomicUsize,

    /// Metadata entries that existed but yielded no identity
    pub metadata_failures: AtomicUsize,

    /// Total time spent scanning archives, in milliseconds
    pub total_scan_time_ms: AtomicU64,

    start_time: Instant,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self {
            archives_scanned: AtomicUsize::new(0),
            archives_kept: AtomicUsize::new(0),
            archives_excluded: AtomicUsize::new(0),
            open_failures: AtomicUsize::new(0),
            metadata_failures: AtomicUsize::new(0),
            total_scan_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record the outcome of one archive.
    pub fn record_archive(&self, kept: bool) {
        self.archives_scanned.fetch_add(1, Ordering::Relaxed);
        if kept {
            self.archives_kept.fetch_add(1, Ordering::Relaxed);
        } else {
            self.archives_excluded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_open_failure(&self) {
        self.open_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_metadata_failures(&self, count: usize) {
        self.metadata_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_scan_time(&self, duration: Duration) {
        self.total_scan_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average scan time per archive in milliseconds
    pub fn avg_scan_time_ms(&self) -> f64 {
        let total = self.total_scan_time_ms.load(Ordering::Relaxed);
        let count = self.archives_scanned.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Scan Metrics Summary ===");
        tracing::info!("Elapsed: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Archives: {} scanned, {} kept, {} excluded",
            self.archives_scanned.load(Ordering::Relaxed),
            self.archives_kept.load(Ordering::Relaxed),
            self.archives_excluded.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Failures: {} unreadable archives, {} unreadable metadata entries",
            self.open_failures.load(Ordering::Relaxed),
            self.metadata_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Scan time: {:.2}s (avg: {:.2}ms per archive)",
            self.total_scan_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_scan_time_ms()
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}
