//! Housekeeping pass over all known hosts and abandoned data.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use common::hosts::HostMatcher;
use common::{Configuration, InventoryPaths};

use crate::classifier::{ClassifiedFilePaths, classify_file_paths};
use crate::error::{IoContext, Result};
use crate::fs;
use crate::history::bundle_history_files;
use crate::report::HousekeepingReport;
use crate::retention::{FileAge, RetentionPolicy};

/// Deletes files and folders, or only logs what it would delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deleter {
    dry_run: bool,
}

impl Deleter {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Remove `path`. A file that is already gone counts as deleted.
    pub fn delete_file(&self, path: &Path) -> Result<()> {
        if self.dry_run {
            tracing::warn!(path = %path.display(), "Would delete file");
            return Ok(());
        }
        tracing::warn!(path = %path.display(), "Deleting file");
        fs::remove_file(path).at(path)
    }

    /// Remove `dir` if nothing is left in it. Never removes anything in dry-run mode.
    pub fn remove_dir_if_empty(&self, dir: &Path) -> Result<bool> {
        if self.dry_run {
            tracing::debug!(path = %dir.display(), "Would remove folder if empty");
            return Ok(false);
        }
        tracing::debug!(path = %dir.display(), "Removing folder if empty");
        let removed = fs::remove_dir_if_empty(dir).at(dir)?;
        if removed {
            tracing::warn!(path = %dir.display(), "Removed abandoned folder");
        }
        Ok(removed)
    }
}

/// History files of one host scheduled for deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryCleanup {
    /// Delta caches of the live tree, deleted regardless of policy.
    pub live_delta_caches: Vec<PathBuf>,
    /// Files the retention policy selected.
    pub expired: Vec<PathBuf>,
}

/// Decide which of a host's history files to delete.
///
/// Bundling and evaluation are repeated on what survives until the policy
/// selects nothing more, so that a second pass at the same `now` finds
/// nothing to do. Without this an archive left alone by the first
/// selection would only expire on the next run.
pub fn plan_history_cleanup(
    tree_timestamp: Option<i64>,
    archive_files: &[PathBuf],
    delta_cache_files: &[PathBuf],
    policy: &RetentionPolicy,
    now: i64,
) -> HistoryCleanup {
    let mut archive_files = archive_files.to_vec();
    let mut delta_cache_files = delta_cache_files.to_vec();
    let mut cleanup = HistoryCleanup::default();

    loop {
        let classified = bundle_history_files(tree_timestamp, &archive_files, &delta_cache_files);

        let mut selected: BTreeSet<PathBuf> = classified
            .delta_cache_from_inventory_tree
            .iter()
            .cloned()
            .collect();
        cleanup
            .live_delta_caches
            .extend(classified.delta_cache_from_inventory_tree);

        let mut expired: BTreeSet<PathBuf> = BTreeSet::new();
        for unit in policy.compute_removable_units(now, &classified.bundles) {
            expired.extend(unit.removable_paths().into_iter().map(Path::to_path_buf));
        }
        for single in &classified.single_archive_files {
            if policy.file_is_too_old(now, single.timestamp) {
                expired.insert(single.path.clone());
            }
        }

        if selected.is_empty() && expired.is_empty() {
            return cleanup;
        }

        selected.extend(expired.iter().cloned());
        archive_files.retain(|path| !selected.contains(path));
        delta_cache_files.retain(|path| !selected.contains(path));
        cleanup.expired.extend(expired);
    }
}

#[derive(Debug, Clone)]
struct HostRetentionRule {
    matcher: HostMatcher,
    policy: RetentionPolicy,
}

/// A configured housekeeping job, ready to run.
#[derive(Debug, Clone)]
pub struct Housekeeping {
    paths: InventoryPaths,
    rules: Vec<HostRetentionRule>,
    default_policy: Option<RetentionPolicy>,
    abandoned_policy: FileAge,
    deleter: Deleter,
}

impl Housekeeping {
    /// Validate the configuration and compile its host rules.
    pub fn new(config: &Configuration) -> Result<Self> {
        config.validate()?;
        let housekeeping = &config.inventory_housekeeping;

        let rules = housekeeping
            .for_hosts
            .iter()
            .map(|rule| {
                Ok(HostRetentionRule {
                    matcher: HostMatcher::new(&rule.match_patterns)?,
                    policy: RetentionPolicy::from(&rule.parameters),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            paths: InventoryPaths::new(&config.omd_root),
            rules,
            default_policy: housekeeping.default.as_ref().map(RetentionPolicy::from),
            abandoned_policy: FileAge::new(housekeeping.abandoned_file_age),
            deleter: Deleter::new(config.dry_run),
        })
    }

    /// Policy of the first rule matching `host_name`, else the default.
    pub fn policy_for(&self, host_name: &str) -> Option<RetentionPolicy> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(host_name))
            .map(|rule| rule.policy)
            .or(self.default_policy)
    }

    /// Run one pass. All ages are measured against `now`.
    pub fn run(&self, host_names: &[String], now: i64) -> Result<HousekeepingReport> {
        let started = Instant::now();
        let mut report = HousekeepingReport::new(now, self.deleter.is_dry_run());
        report.hosts_seen = host_names.len();

        tracing::info!(
            hosts = host_names.len(),
            rules = self.rules.len(),
            dry_run = self.deleter.is_dry_run(),
            "Starting inventory housekeeping"
        );

        let classified = classify_file_paths(&self.paths, host_names)?;
        self.clean_up_hosts(&classified, now, &mut report)?;
        self.clean_up_abandoned(&classified, now, &mut report)?;

        report.duration = started.elapsed();
        Ok(report)
    }

    fn clean_up_hosts(
        &self,
        classified: &ClassifiedFilePaths,
        now: i64,
        report: &mut HousekeepingReport,
    ) -> Result<()> {
        for (host_name, files) in &classified.by_host {
            let _span = tracing::debug_span!("host", host = %host_name).entered();

            let Some(policy) = self.policy_for(host_name) else {
                tracing::debug!("No retention policy applies, skipping host");
                report.hosts_skipped += 1;
                continue;
            };

            let cleanup = plan_history_cleanup(
                files.inventory_tree_timestamp,
                &files.archive_files,
                &files.delta_cache_files,
                &policy,
                now,
            );
            tracing::debug!(
                live_delta_caches = cleanup.live_delta_caches.len(),
                expired = cleanup.expired.len(),
                "Planned history cleanup"
            );

            for path in &cleanup.live_delta_caches {
                self.deleter.delete_file(path)?;
                report.live_delta_caches_deleted += 1;
            }
            for path in &cleanup.expired {
                self.deleter.delete_file(path)?;
                report.files_deleted += 1;
            }
            report.hosts_processed += 1;
        }
        Ok(())
    }

    fn clean_up_abandoned(
        &self,
        classified: &ClassifiedFilePaths,
        now: i64,
        report: &mut HousekeepingReport,
    ) -> Result<()> {
        for file in &classified.abandoned_host_files {
            if self.abandoned_policy.file_is_too_old(now, file.timestamp) {
                self.deleter.delete_file(&file.path)?;
                report.abandoned_files_deleted += 1;
            }
        }

        for (folder, files) in &classified.abandoned_host_folders_and_files {
            for file in files {
                if self.abandoned_policy.file_is_too_old(now, file.timestamp) {
                    self.deleter.delete_file(&file.path)?;
                    report.abandoned_files_deleted += 1;
                }
            }
            if self.deleter.remove_dir_if_empty(folder)? {
                report.abandoned_folders_removed += 1;
            }
        }
        Ok(())
    }
}

/// Build a [`Housekeeping`] from `config` and run it once.
pub fn run(config: &Configuration, host_names: &[String], now: i64) -> Result<HousekeepingReport> {
    Housekeeping::new(config)?.run(host_names, now)
}
