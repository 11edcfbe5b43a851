//! Pairing of one host's archived inventory trees into retention bundles.
//!
//! Archive files are named `<timestamp>.<ext>`, delta cache files
//! `<previous>_<current>.<ext>` where `previous` is `None` for the very
//! first delta of a host.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use common::TreePath;

use crate::error::{IoContext, Result};
use crate::fs;
use crate::retention::{ArchiveBundle, RetentionUnit, TimestampedFile};

/// Previous timestamp of a delta cache computed against no earlier tree.
pub const NO_PREVIOUS_TIMESTAMP: i64 = -1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedHistoryFiles {
    /// Delta caches ending at the live inventory tree, deleted regardless of policy.
    pub delta_cache_from_inventory_tree: Vec<PathBuf>,
    /// Archive bundles followed by delta caches that fit no bundle.
    pub bundles: Vec<RetentionUnit>,
    /// Archives without a neighbour to pair with.
    pub single_archive_files: Vec<TimestampedFile>,
}

fn stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

/// Timestamp of an archive file, `None` for stray files.
pub fn parse_archive_timestamp(path: &Path) -> Option<i64> {
    stem(path)?.parse().ok()
}

/// `(previous, current)` of a delta cache file, `None` for stray files.
pub fn parse_delta_cache_timestamps(path: &Path) -> Option<(i64, i64)> {
    let (previous, current) = stem(path)?.split_once('_')?;
    let previous = match previous {
        "None" => NO_PREVIOUS_TIMESTAMP,
        other => other.parse().ok()?,
    };
    Some((previous, current.parse().ok()?))
}

/// Modification time of the live tree, falling back to its legacy location.
pub fn inventory_tree_timestamp(tree: &TreePath) -> Result<Option<i64>> {
    for path in tree.both() {
        if let Some(mtime) = fs::mtime(path).at(path)? {
            return Ok(Some(mtime));
        }
    }
    Ok(None)
}

/// Pair adjacent archives, attach matching delta caches and leave the rest
/// as standalone units.
///
/// Files whose names do not follow the conventions are ignored. When several
/// archives carry the same timestamp, the `.json` one takes part in bundles
/// and the others are single archive files.
pub fn bundle_history_files(
    tree_timestamp: Option<i64>,
    archive_files: &[PathBuf],
    delta_cache_files: &[PathBuf],
) -> ClassifiedHistoryFiles {
    let mut archives: BTreeMap<i64, Vec<PathBuf>> = BTreeMap::new();
    for path in archive_files {
        if let Some(timestamp) = parse_archive_timestamp(path) {
            archives.entry(timestamp).or_default().push(path.clone());
        }
    }
    for paths in archives.values_mut() {
        paths.sort_by_key(|p| (p.extension().is_none_or(|ext| ext != "json"), p.clone()));
    }

    let mut delta_cache_from_inventory_tree = Vec::new();
    let mut delta_caches: BTreeMap<(i64, i64), Vec<TimestampedFile>> = BTreeMap::new();
    for path in delta_cache_files {
        let Some((previous, current)) = parse_delta_cache_timestamps(path) else {
            continue;
        };
        if tree_timestamp == Some(current) {
            delta_cache_from_inventory_tree.push(path.clone());
        } else {
            delta_caches
                .entry((previous, current))
                .or_default()
                .push(TimestampedFile::new(path.clone(), current));
        }
    }
    for files in delta_caches.values_mut() {
        files.sort();
    }
    delta_cache_from_inventory_tree.sort();

    let timestamps: Vec<i64> = archives.keys().copied().collect();
    let paired: BTreeMap<(i64, i64), ArchiveBundle> = timestamps
        .windows(2)
        .map(|pair| {
            let key = (pair[0], pair[1]);
            let bundle = ArchiveBundle {
                previous: archives[&pair[0]][0].clone(),
                current: archives[&pair[1]][0].clone(),
                delta_cache: delta_caches.get(&key).and_then(|files| files.first().cloned()),
                timestamp: pair[1],
            };
            (key, bundle)
        })
        .collect();

    let standalone = delta_caches.iter().flat_map(|(key, files)| {
        let attached = usize::from(paired.contains_key(key));
        files.iter().skip(attached).cloned()
    });

    let bundles: Vec<RetentionUnit> = paired
        .values()
        .cloned()
        .map(RetentionUnit::from)
        .chain(standalone.map(RetentionUnit::from))
        .collect();

    // With a single timestamp nothing is paired, so every archive stands alone.
    let bundled_per_timestamp = usize::from(timestamps.len() >= 2);
    let single_archive_files = archives
        .iter()
        .flat_map(|(timestamp, paths)| {
            paths
                .iter()
                .skip(bundled_per_timestamp)
                .map(|path| TimestampedFile::new(path.clone(), *timestamp))
        })
        .collect();

    ClassifiedHistoryFiles {
        delta_cache_from_inventory_tree,
        bundles,
        single_archive_files,
    }
}
