//! Outcome of a housekeeping pass.

use std::time::Duration;

use chrono::DateTime;

/// Counters collected during one [`crate::Housekeeping::run`].
///
/// In dry-run mode the deletion counters count what would have been deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HousekeepingReport {
    /// Reference time of the pass, unix seconds.
    pub now: i64,
    pub hosts_seen: usize,
    pub hosts_processed: usize,
    /// Hosts no rule matched while no default policy is configured.
    pub hosts_skipped: usize,
    pub files_deleted: usize,
    pub live_delta_caches_deleted: usize,
    pub abandoned_files_deleted: usize,
    pub abandoned_folders_removed: usize,
    pub dry_run: bool,
    pub duration: Duration,
}

impl HousekeepingReport {
    pub fn new(now: i64, dry_run: bool) -> Self {
        Self {
            now,
            dry_run,
            ..Default::default()
        }
    }

    /// Files removed in total, abandoned ones included.
    pub fn total_deleted(&self) -> usize {
        self.files_deleted + self.live_delta_caches_deleted + self.abandoned_files_deleted
    }

    pub fn log(&self) {
        let now = DateTime::from_timestamp(self.now, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| self.now.to_string());

        tracing::info!(
            now = %now,
            hosts_seen = self.hosts_seen,
            hosts_processed = self.hosts_processed,
            hosts_skipped = self.hosts_skipped,
            files_deleted = self.files_deleted,
            live_delta_caches_deleted = self.live_delta_caches_deleted,
            abandoned_files_deleted = self.abandoned_files_deleted,
            abandoned_folders_removed = self.abandoned_folders_removed,
            dry_run = self.dry_run,
            duration_ms = self.duration.as_millis() as u64,
            "Inventory housekeeping completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_deleted() {
        let report = HousekeepingReport {
            files_deleted: 3,
            live_delta_caches_deleted: 1,
            abandoned_files_deleted: 2,
            abandoned_folders_removed: 5,
            ..HousekeepingReport::new(0, false)
        };
        assert_eq!(report.total_deleted(), 6);
    }

    #[test]
    fn test_log_with_out_of_range_now() {
        HousekeepingReport::new(i64::MAX, true).log();
    }
}
