//! Reconciliation of the inventory stores against the known hosts.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use common::{InventoryPaths, TreePath};

use crate::error::{IoContext, Result};
use crate::fs;
use crate::history::{
    inventory_tree_timestamp, parse_archive_timestamp, parse_delta_cache_timestamps,
};
use crate::retention::TimestampedFile;

/// Expected locations of one host's inventory data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFilePaths {
    pub inventory_tree: TreePath,
    pub inventory_tree_gz: TreePath,
    pub status_data_tree: TreePath,
    /// Modification time of the live inventory tree when the stores were scanned.
    pub inventory_tree_timestamp: Option<i64>,
    pub archive_files: Vec<PathBuf>,
    pub delta_cache_files: Vec<PathBuf>,
}

impl HostFilePaths {
    fn resolve(paths: &InventoryPaths, host_name: &str) -> Result<Self> {
        let archive_dir = paths.archive_host(host_name);
        let delta_cache_dir = paths.delta_cache_host(host_name);
        let inventory_tree = paths.inventory_tree(host_name);
        Ok(Self {
            inventory_tree_timestamp: inventory_tree_timestamp(&inventory_tree)?,
            inventory_tree,
            inventory_tree_gz: paths.inventory_tree_gz(host_name),
            status_data_tree: paths.status_data_tree(host_name),
            archive_files: fs::list_files(&archive_dir).at(&archive_dir)?,
            delta_cache_files: fs::list_files(&delta_cache_dir).at(&delta_cache_dir)?,
        })
    }

    fn tree_paths(&self) -> impl Iterator<Item = &Path> {
        [
            &self.inventory_tree,
            &self.inventory_tree_gz,
            &self.status_data_tree,
        ]
        .into_iter()
        .flat_map(TreePath::both)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedFilePaths {
    pub by_host: BTreeMap<String, HostFilePaths>,
    /// Trees in the inventory and status data roots of hosts that no longer exist.
    pub abandoned_host_files: Vec<TimestampedFile>,
    /// Archive and delta cache folders of hosts that no longer exist.
    pub abandoned_host_folders_and_files: BTreeMap<PathBuf, Vec<TimestampedFile>>,
}

/// Scan the stores and sort every file into a known host or the abandoned lists.
///
/// With no known hosts nothing is scanned: an empty host list more likely
/// means the listing failed than that every host was removed.
pub fn classify_file_paths(
    paths: &InventoryPaths,
    host_names: &[String],
) -> Result<ClassifiedFilePaths> {
    if host_names.is_empty() {
        tracing::debug!("No known hosts, skipping classification");
        return Ok(ClassifiedFilePaths::default());
    }

    let by_host = host_names
        .iter()
        .map(|host_name| Ok((host_name.clone(), HostFilePaths::resolve(paths, host_name)?)))
        .collect::<Result<BTreeMap<_, _>>>()?;

    let abandoned_host_files = abandoned_host_files(paths, &by_host)?;
    let abandoned_host_folders_and_files = abandoned_host_folders(paths, host_names)?;

    Ok(ClassifiedFilePaths {
        by_host,
        abandoned_host_files,
        abandoned_host_folders_and_files,
    })
}

fn abandoned_host_files(
    paths: &InventoryPaths,
    by_host: &BTreeMap<String, HostFilePaths>,
) -> Result<Vec<TimestampedFile>> {
    let known: HashSet<&Path> = by_host.values().flat_map(|host| host.tree_paths()).collect();

    let mut abandoned = Vec::new();
    for root in [&paths.inventory_dir, &paths.status_data_dir] {
        for path in fs::visible_files(root, 1).at(root)? {
            if known.contains(path.as_path()) {
                continue;
            }
            // Gone since the listing: nothing left to clean up.
            let Some(timestamp) = fs::mtime(&path).at(&path)? else {
                continue;
            };
            abandoned.push(TimestampedFile::new(path, timestamp));
        }
    }
    Ok(abandoned)
}

fn abandoned_host_folders(
    paths: &InventoryPaths,
    host_names: &[String],
) -> Result<BTreeMap<PathBuf, Vec<TimestampedFile>>> {
    let known_dirs: HashSet<PathBuf> = host_names
        .iter()
        .flat_map(|host_name| [paths.archive_host(host_name), paths.delta_cache_host(host_name)])
        .collect();

    let mut folders: BTreeMap<PathBuf, Vec<TimestampedFile>> = BTreeMap::new();
    let stores: [(&Path, fn(&Path) -> Option<i64>); 2] = [
        (paths.archive_dir.as_path(), parse_archive_timestamp),
        (paths.delta_cache_dir.as_path(), |path| {
            parse_delta_cache_timestamps(path).map(|(_, current)| current)
        }),
    ];

    for (root, timestamp_of) in stores {
        for dir in fs::visible_dirs(root).at(root)? {
            if !known_dirs.contains(&dir) {
                folders.entry(dir).or_default();
            }
        }

        for path in fs::visible_files(root, 2).at(root)? {
            let Some(parent) = path.parent() else {
                continue;
            };
            if known_dirs.contains(parent) {
                continue;
            }
            let Some(timestamp) = timestamp_of(&path) else {
                continue;
            };
            folders
                .entry(parent.to_path_buf())
                .or_default()
                .push(TimestampedFile::new(path, timestamp));
        }
    }
    Ok(folders)
}
