//! Retention policy evaluation.

use std::collections::HashSet;

use common::config::{CombinedParameters, PolicyParameters, Strategy};

use super::unit::RetentionUnit;

/// Removes what is at least `max_age_seconds` old.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAge {
    pub max_age_seconds: i64,
}

impl FileAge {
    pub fn new(max_age_seconds: i64) -> Self {
        Self { max_age_seconds }
    }

    /// `timestamp` lies at or before the cutoff `now - max_age_seconds`.
    pub fn file_is_too_old(&self, now: i64, timestamp: i64) -> bool {
        now.saturating_sub(self.max_age_seconds) >= timestamp
    }

    pub fn compute_removable_units(&self, now: i64, units: &[RetentionUnit]) -> Vec<RetentionUnit> {
        units
            .iter()
            .filter(|unit| self.file_is_too_old(now, unit.timestamp()))
            .cloned()
            .collect()
    }
}

/// Keeps the `keep_count` newest units and removes the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountCutoff {
    pub keep_count: usize,
}

impl CountCutoff {
    pub fn new(keep_count: usize) -> Self {
        Self { keep_count }
    }

    /// Oldest excess units, newest first.
    pub fn compute_removable_units(&self, units: &[RetentionUnit]) -> Vec<RetentionUnit> {
        let mut sorted: Vec<&RetentionUnit> = units.iter().collect();
        sorted.sort_by_key(|unit| std::cmp::Reverse(unit.timestamp()));
        sorted
            .into_iter()
            .skip(self.keep_count)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    FileAge(FileAge),
    CountCutoff(CountCutoff),
    Combined {
        strategy: Strategy,
        file_age: FileAge,
        count_cutoff: CountCutoff,
    },
}

impl RetentionPolicy {
    /// Whether a single, unbundled file has expired.
    ///
    /// A count cutoff needs peers to compare with, so it never expires a
    /// single file, not even as part of an `or` combination.
    pub fn file_is_too_old(&self, now: i64, timestamp: i64) -> bool {
        match self {
            RetentionPolicy::FileAge(file_age) => file_age.file_is_too_old(now, timestamp),
            RetentionPolicy::CountCutoff(_) => false,
            RetentionPolicy::Combined { file_age, .. } => file_age.file_is_too_old(now, timestamp),
        }
    }

    /// Units to remove. Combined rules intersect (`and`) or unite (`or`) the
    /// selections of their parts; the result keeps the input order.
    pub fn compute_removable_units(&self, now: i64, units: &[RetentionUnit]) -> Vec<RetentionUnit> {
        match self {
            RetentionPolicy::FileAge(file_age) => file_age.compute_removable_units(now, units),
            RetentionPolicy::CountCutoff(count_cutoff) => {
                count_cutoff.compute_removable_units(units)
            }
            RetentionPolicy::Combined {
                strategy,
                file_age,
                count_cutoff,
            } => {
                let by_age: HashSet<RetentionUnit> = file_age
                    .compute_removable_units(now, units)
                    .into_iter()
                    .collect();
                let by_count: HashSet<RetentionUnit> = count_cutoff
                    .compute_removable_units(units)
                    .into_iter()
                    .collect();

                let mut seen = HashSet::new();
                units
                    .iter()
                    .filter(|unit| match strategy {
                        Strategy::And => by_age.contains(*unit) && by_count.contains(*unit),
                        Strategy::Or => by_age.contains(*unit) || by_count.contains(*unit),
                    })
                    .filter(|unit| seen.insert((*unit).clone()))
                    .cloned()
                    .collect()
            }
        }
    }
}

impl From<&CombinedParameters> for RetentionPolicy {
    fn from(params: &CombinedParameters) -> Self {
        RetentionPolicy::Combined {
            strategy: params.strategy,
            file_age: FileAge::new(params.file_age),
            count_cutoff: CountCutoff::new(params.number_of_history_entries),
        }
    }
}

impl From<&PolicyParameters> for RetentionPolicy {
    fn from(params: &PolicyParameters) -> Self {
        match params {
            PolicyParameters::FileAge(max_age_seconds) => {
                RetentionPolicy::FileAge(FileAge::new(*max_age_seconds))
            }
            PolicyParameters::NumberOfHistoryEntries(keep_count) => {
                RetentionPolicy::CountCutoff(CountCutoff::new(*keep_count))
            }
            PolicyParameters::Combined(combined) => RetentionPolicy::from(combined),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retention::unit::{ArchiveBundle, TimestampedFile};
    use std::path::PathBuf;

    fn files(timestamps: &[i64]) -> Vec<RetentionUnit> {
        timestamps
            .iter()
            .map(|ts| TimestampedFile::new(format!("{ts}.json"), *ts).into())
            .collect()
    }

    fn timestamps(units: &[RetentionUnit]) -> Vec<i64> {
        let mut ts: Vec<i64> = units.iter().map(RetentionUnit::timestamp).collect();
        ts.sort();
        ts
    }

    fn as_set(units: Vec<RetentionUnit>) -> HashSet<RetentionUnit> {
        units.into_iter().collect()
    }

    #[test]
    fn test_file_age_threshold() {
        let policy = FileAge::new(150);
        assert!(policy.file_is_too_old(300, 100));
        assert!(policy.file_is_too_old(300, 150));
        assert!(!policy.file_is_too_old(300, 151));
        assert!(!policy.file_is_too_old(300, 200));
    }

    #[test]
    fn test_file_age_matches_cutoff_comparison() {
        for now in [0, 1, 500, 1_700_000_000] {
            for max_age in [0, 1, 59, 3600] {
                for timestamp in [-1, 0, 1, 440, 500, 1_699_996_400] {
                    assert_eq!(
                        FileAge::new(max_age).file_is_too_old(now, timestamp),
                        now - max_age >= timestamp,
                        "now={now} max_age={max_age} timestamp={timestamp}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_file_age_does_not_overflow() {
        assert!(!FileAge::new(i64::MAX).file_is_too_old(-10, 0));
    }

    #[test]
    fn test_count_cutoff_keeps_newest() {
        let units = files(&[10, 30, 20]);
        let removable = CountCutoff::new(1).compute_removable_units(&units);
        assert_eq!(timestamps(&removable), vec![10, 20]);
    }

    #[test]
    fn test_count_cutoff_removes_exactly_the_oldest() {
        let units = files(&[5, 1, 9, 3, 7, 2, 8]);
        for keep in 0..units.len() {
            let removable = CountCutoff::new(keep).compute_removable_units(&units);
            assert_eq!(removable.len(), units.len() - keep);

            let mut all: Vec<i64> = units.iter().map(RetentionUnit::timestamp).collect();
            all.sort();
            assert_eq!(timestamps(&removable), all[..units.len() - keep].to_vec());
        }
    }

    #[test]
    fn test_count_cutoff_keeps_everything_below_limit() {
        let units = files(&[1, 2]);
        assert!(CountCutoff::new(5).compute_removable_units(&units).is_empty());
    }

    #[test]
    fn test_count_alone_never_expires_single_files() {
        let policy = RetentionPolicy::CountCutoff(CountCutoff::new(0));
        assert!(!policy.file_is_too_old(i64::MAX, 0));
    }

    #[test]
    fn test_combined_single_file_uses_age_only() {
        for strategy in [Strategy::And, Strategy::Or] {
            let policy = RetentionPolicy::Combined {
                strategy,
                file_age: FileAge::new(100),
                count_cutoff: CountCutoff::new(0),
            };
            assert!(policy.file_is_too_old(1000, 900));
            assert!(!policy.file_is_too_old(1000, 901));
        }
    }

    #[test]
    fn test_combined_and_is_intersection() {
        let units = files(&[100, 200, 300, 400, 500]);
        let file_age = FileAge::new(250);
        let count_cutoff = CountCutoff::new(4);
        let policy = RetentionPolicy::Combined {
            strategy: Strategy::And,
            file_age,
            count_cutoff,
        };

        let by_age = as_set(file_age.compute_removable_units(500, &units));
        let by_count = as_set(count_cutoff.compute_removable_units(&units));
        let expected: HashSet<RetentionUnit> = by_age.intersection(&by_count).cloned().collect();

        let removable = policy.compute_removable_units(500, &units);
        assert_eq!(as_set(removable.clone()), expected);
        assert_eq!(timestamps(&removable), vec![100]);
    }

    #[test]
    fn test_combined_or_is_union() {
        let units = files(&[100, 200, 300, 400, 500]);
        let file_age = FileAge::new(250);
        let count_cutoff = CountCutoff::new(2);
        let policy = RetentionPolicy::Combined {
            strategy: Strategy::Or,
            file_age,
            count_cutoff,
        };

        let by_age = as_set(file_age.compute_removable_units(500, &units));
        let by_count = as_set(count_cutoff.compute_removable_units(&units));
        let expected: HashSet<RetentionUnit> = by_age.union(&by_count).cloned().collect();

        let removable = policy.compute_removable_units(500, &units);
        assert_eq!(as_set(removable.clone()), expected);
        assert_eq!(timestamps(&removable), vec![100, 200, 300]);
    }

    #[test]
    fn test_bundle_at_age_boundary_is_kept() {
        let bundles: Vec<RetentionUnit> = [(100, 200), (200, 300)]
            .into_iter()
            .map(|(previous, current)| {
                ArchiveBundle {
                    previous: PathBuf::from(format!("{previous}.json")),
                    current: PathBuf::from(format!("{current}.json")),
                    delta_cache: None,
                    timestamp: current,
                }
                .into()
            })
            .collect();

        let policy = RetentionPolicy::FileAge(FileAge::new(150));
        assert!(policy.compute_removable_units(300, &bundles).is_empty());
    }

    #[test]
    fn test_from_parameters() {
        assert_eq!(
            RetentionPolicy::from(&PolicyParameters::FileAge(60)),
            RetentionPolicy::FileAge(FileAge::new(60))
        );
        assert_eq!(
            RetentionPolicy::from(&PolicyParameters::NumberOfHistoryEntries(3)),
            RetentionPolicy::CountCutoff(CountCutoff::new(3))
        );
        assert_eq!(
            RetentionPolicy::from(&PolicyParameters::Combined(CombinedParameters {
                strategy: Strategy::Or,
                file_age: 60,
                number_of_history_entries: 3,
            })),
            RetentionPolicy::Combined {
                strategy: Strategy::Or,
                file_age: FileAge::new(60),
                count_cutoff: CountCutoff::new(3),
            }
        );
    }
}
