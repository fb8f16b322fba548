// Run metrics module
//
// Lightweight counters for a synchronization run, shared by all profile tasks

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters for one synchronization run
///
/// Uses atomic operations so concurrent profile tasks can record without
/// locks. Logged once when the run finishes.
#[derive(Debug)]
pub struct SyncMetrics {
    /// Profiles whose files were all rewritten
    pub profiles_synced: AtomicUsize,

    /// Profiles that failed with an error
    pub profiles_failed: AtomicUsize,

    /// Profile files written
    pub files_written: AtomicUsize,

    /// Backups created by renaming a previous file
    pub backups_created: AtomicUsize,

    /// Profile files that did not exist when read
    pub missing_files: AtomicUsize,

    /// Modlist/plugins entries naming something no longer installed
    pub stale_entries: AtomicUsize,

    /// Load units written to plugins and loadorder
    pub units_resolved: AtomicUsize,

    /// Load units dropped because a later mod shipped the same name
    pub duplicate_units: AtomicUsize,

    /// Load units whose header could not be read
    pub unclassified_units: AtomicUsize,

    /// Total time spent in profile tasks, in milliseconds
    pub total_profile_time_ms: AtomicU64,

    start_time: Instant,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            profiles_synced: AtomicUsize::new(0),
            profiles_failed: AtomicUsize::new(0),
            files_written: AtomicUsize::new(0),
            backups_created: AtomicUsize::new(0),
            missing_files: AtomicUsize::new(0),
            stale_entries: AtomicUsize::new(0),
            units_resolved: AtomicUsize::new(0),
            duplicate_units: AtomicUsize::new(0),
            unclassified_units: AtomicUsize::new(0),
            total_profile_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_profile_synced(&self, duration: Duration) {
        self.profiles_synced.fetch_add(1, Ordering::Relaxed);
        self.total_profile_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_profile_failed(&self) {
        self.profiles_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_written(&self, backed_up: bool) {
        self.files_written.fetch_add(1, Ordering::Relaxed);
        if backed_up {
            self.backups_created.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_missing_file(&self) {
        self.missing_files.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_entry(&self) {
        self.stale_entries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_units(&self, resolved: usize, duplicates: usize) {
        self.units_resolved.fetch_add(resolved, Ordering::Relaxed);
        self.duplicate_units.fetch_add(duplicates, Ordering::Relaxed);
    }

    pub fn record_unclassified_unit(&self) {
        self.unclassified_units.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average time per synced profile in milliseconds
    pub fn avg_profile_time_ms(&self) -> f64 {
        let total = self.total_profile_time_ms.load(Ordering::Relaxed);
        let count = self.profiles_synced.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Synchronization Summary ===");
        tracing::info!("Elapsed: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Profiles: {} synced, {} failed (avg: {:.2}ms per profile)",
            self.profiles_synced.load(Ordering::Relaxed),
            self.profiles_failed.load(Ordering::Relaxed),
            self.avg_profile_time_ms()
        );
        tracing::info!(
            "Files: {} written, {} backed up, {} missing before sync",
            self.files_written.load(Ordering::Relaxed),
            self.backups_created.load(Ordering::Relaxed),
            self.missing_files.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Plugins: {} resolved, {} duplicates dropped, {} unclassified, {} stale entries",
            self.units_resolved.load(Ordering::Relaxed),
            self.duplicate_units.load(Ordering::Relaxed),
            self.unclassified_units.load(Ordering::Relaxed),
            self.stale_entries.load(Ordering::Relaxed)
        );
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = SyncMetrics::new();
        assert_eq!(metrics.profiles_synced.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.files_written.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_files() {
        let metrics = SyncMetrics::new();

        metrics.record_file_written(true);
        metrics.record_file_written(false);
        metrics.record_missing_file();

        assert_eq!(metrics.files_written.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.backups_created.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.missing_files.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_profile_time_average() {
        let metrics = SyncMetrics::new();

        metrics.record_profile_synced(Duration::from_millis(100));
        metrics.record_profile_synced(Duration::from_millis(200));
        metrics.record_profile_failed();

        assert_eq!(metrics.total_profile_time_ms.load(Ordering::Relaxed), 300);
        assert_eq!(metrics.avg_profile_time_ms(), 150.0);
        assert_eq!(metrics.profiles_failed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_avg_profile_time_no_profiles() {
        let metrics = SyncMetrics::new();
        assert_eq!(metrics.avg_profile_time_ms(), 0.0);
    }

    #[test]
    fn test_unit_counters() {
        let metrics = SyncMetrics::new();

        metrics.record_units(10, 2);
        metrics.record_units(5, 0);
        metrics.record_unclassified_unit();
        metrics.record_stale_entry();

        assert_eq!(metrics.units_resolved.load(Ordering::Relaxed), 15);
        assert_eq!(metrics.duplicate_units.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.unclassified_units.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.stale_entries.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_uptime() {
        let metrics = SyncMetrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.uptime().as_millis() >= 10);
    }
}
