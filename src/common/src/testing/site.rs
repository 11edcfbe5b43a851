//! Throwaway site root populated with inventory files.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use crate::paths::InventoryPaths;

/// A temporary site root with helpers to lay out inventory data.
///
/// All writers set the file modification time explicitly, archive and delta
/// cache files get their embedded timestamp as mtime.
pub struct TestSite {
    dir: TempDir,
    pub paths: InventoryPaths,
}

impl Default for TestSite {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSite {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temporary site root");
        let paths = InventoryPaths::new(dir.path());
        Self { dir, paths }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Create `path` (and its parents) with modification time `mtime`.
    pub fn write_file(&self, path: &Path, mtime: i64) -> PathBuf {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(path, b"{}").expect("Failed to write file");
        set_mtime(path, mtime);
        path.to_path_buf()
    }

    pub fn inventory_tree(&self, host_name: &str, mtime: i64) -> PathBuf {
        self.write_file(&self.paths.inventory_tree(host_name).path, mtime)
    }

    pub fn status_data_tree(&self, host_name: &str, mtime: i64) -> PathBuf {
        self.write_file(&self.paths.status_data_tree(host_name).path, mtime)
    }

    pub fn archive(&self, host_name: &str, timestamp: i64) -> PathBuf {
        self.write_file(&self.paths.archive_tree(host_name, timestamp).path, timestamp)
    }

    pub fn delta_cache(&self, host_name: &str, previous: Option<i64>, current: i64) -> PathBuf {
        self.write_file(
            &self.paths.delta_cache_tree(host_name, previous, current).path,
            current,
        )
    }

    /// Every regular file below the site root.
    pub fn files(&self) -> BTreeSet<PathBuf> {
        let mut files = BTreeSet::new();
        collect_files(self.root(), &mut files);
        files
    }
}

/// Set the modification time of an existing file to a unix timestamp.
pub fn set_mtime(path: &Path, mtime: i64) {
    let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(mtime.max(0) as u64);
    File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_modified(modified))
        .expect("Failed to set modification time");
}

fn collect_files(dir: &Path, files: &mut BTreeSet<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, files);
        } else {
            files.insert(path);
        }
    }
}
