// Run metrics module
//
// Lightweight counters for the configuration cache and the diagnostic checks

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters shared by the configuration cache and the diagnostic pipeline
///
/// Uses atomic operations for thread-safe tracking without locks. The
/// disk-write counter doubles as the observable used by tests that assert
/// how many times a store was persisted.
#[derive(Debug)]
pub struct Metrics {
    /// Store accesses served from an up-to-date cached document
    pub cache_hits: AtomicU64,

    /// Store documents (re)loaded from disk
    pub cache_reloads: AtomicU64,

    /// Store documents written back to disk
    pub disk_writes: AtomicU64,

    /// Reads whose leaf could not be coerced to the requested type
    pub coercion_failures: AtomicU64,

    /// Diagnostic checks executed
    pub checks_run: AtomicU64,

    /// Warning or caution messages produced
    pub warnings_emitted: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            cache_hits: AtomicU64::new(0),
            cache_reloads: AtomicU64::new(0),
            disk_writes: AtomicU64::new(0),
            coercion_failures: AtomicU64::new(0),
            checks_run: AtomicU64::new(0),
            warnings_emitted: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_reload(&self) {
        self.cache_reloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disk_write(&self) {
        self.disk_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coercion_failure(&self) {
        self.coercion_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_check(&self) {
        self.checks_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_warnings(&self, count: usize) {
        self.warnings_emitted
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Current value of the disk-write counter
    pub fn disk_writes(&self) -> u64 {
        self.disk_writes.load(Ordering::Relaxed)
    }

    /// Current value of the reload counter
    pub fn cache_reloads(&self) -> u64 {
        self.cache_reloads.load(Ordering::Relaxed)
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Run Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Config cache: {} hits, {} reloads, {} writes, {} coercion failures",
            self.cache_hits.load(Ordering::Relaxed),
            self.cache_reloads.load(Ordering::Relaxed),
            self.disk_writes.load(Ordering::Relaxed),
            self.coercion_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Checks: {} run, {} warnings",
            self.checks_run.load(Ordering::Relaxed),
            self.warnings_emitted.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
