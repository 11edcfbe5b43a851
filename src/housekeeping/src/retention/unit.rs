use std::path::{Path, PathBuf};

/// A file together with the time it is aged by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimestampedFile {
    pub path: PathBuf,
    /// Unix seconds.
    pub timestamp: i64,
}

impl TimestampedFile {
    pub fn new(path: impl Into<PathBuf>, timestamp: i64) -> Self {
        Self {
            path: path.into(),
            timestamp,
        }
    }
}

/// Two adjacent archived trees and the delta cached between them.
///
/// Only `previous` and `delta_cache` are ever deleted through a bundle:
/// `current` is the `previous` of the next bundle and goes away with that one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveBundle {
    pub previous: PathBuf,
    pub current: PathBuf,
    pub delta_cache: Option<TimestampedFile>,
    /// Timestamp of `current`.
    pub timestamp: i64,
}

impl ArchiveBundle {
    /// Files removed when this bundle expires.
    pub fn removable_paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.previous.as_path())
            .chain(self.delta_cache.as_ref().map(|d| d.path.as_path()))
    }
}

/// Anything a retention policy decides on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RetentionUnit {
    File(TimestampedFile),
    Bundle(ArchiveBundle),
}

impl RetentionUnit {
    pub fn timestamp(&self) -> i64 {
        match self {
            RetentionUnit::File(file) => file.timestamp,
            RetentionUnit::Bundle(bundle) => bundle.timestamp,
        }
    }

    /// Files to delete when this unit is removed.
    pub fn removable_paths(&self) -> Vec<&Path> {
        match self {
            RetentionUnit::File(file) => vec![file.path.as_path()],
            RetentionUnit::Bundle(bundle) => bundle.removable_paths().collect(),
        }
    }
}

impl From<TimestampedFile> for RetentionUnit {
    fn from(file: TimestampedFile) -> Self {
        RetentionUnit::File(file)
    }
}

impl From<ArchiveBundle> for RetentionUnit {
    fn from(bundle: ArchiveBundle) -> Self {
        RetentionUnit::Bundle(bundle)
    }
}
