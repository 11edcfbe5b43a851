//! Location of inventory data below a site root.

use std::path::{Path, PathBuf};

/// A file location with its pre-JSON legacy fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreePath {
    pub path: PathBuf,
    pub legacy: PathBuf,
}

impl TreePath {
    /// Both the canonical and the legacy location.
    pub fn both(&self) -> [&Path; 2] {
        [&self.path, &self.legacy]
    }
}

/// Directory layout of the inventory, status data, archive and delta cache stores.
#[derive(Debug, Clone)]
pub struct InventoryPaths {
    pub inventory_dir: PathBuf,
    pub status_data_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub delta_cache_dir: PathBuf,
}

impl InventoryPaths {
    pub fn new(omd_root: &Path) -> Self {
        let inventory_dir = omd_root.join("var/check_mk/inventory");
        let status_data_dir = omd_root.join("tmp/check_mk/status_data");
        Self {
            inventory_dir,
            status_data_dir,
            archive_dir: omd_root.join("var/check_mk/inventory_archive"),
            delta_cache_dir: omd_root.join("var/check_mk/inventory_delta_cache"),
        }
    }

    pub fn inventory_tree(&self, host_name: &str) -> TreePath {
        TreePath {
            path: self.inventory_dir.join(format!("{host_name}.json")),
            legacy: self.inventory_dir.join(host_name),
        }
    }

    pub fn inventory_tree_gz(&self, host_name: &str) -> TreePath {
        TreePath {
            path: self.inventory_dir.join(format!("{host_name}.json.gz")),
            legacy: self.inventory_dir.join(format!("{host_name}.gz")),
        }
    }

    pub fn status_data_tree(&self, host_name: &str) -> TreePath {
        TreePath {
            path: self.status_data_dir.join(format!("{host_name}.json")),
            legacy: self.status_data_dir.join(host_name),
        }
    }

    pub fn archive_host(&self, host_name: &str) -> PathBuf {
        self.archive_dir.join(host_name)
    }

    /// Archived inventory tree taken at `timestamp`.
    pub fn archive_tree(&self, host_name: &str, timestamp: i64) -> TreePath {
        let dir = self.archive_host(host_name);
        TreePath {
            path: dir.join(format!("{timestamp}.json")),
            legacy: dir.join(timestamp.to_string()),
        }
    }

    pub fn delta_cache_host(&self, host_name: &str) -> PathBuf {
        self.delta_cache_dir.join(host_name)
    }

    /// Cached delta between two archived trees. A missing previous tree is written as `None`.
    pub fn delta_cache_tree(
        &self,
        host_name: &str,
        previous_timestamp: Option<i64>,
        current_timestamp: i64,
    ) -> TreePath {
        let dir = self.delta_cache_host(host_name);
        let stem = match previous_timestamp {
            Some(previous) => format!("{previous}_{current_timestamp}"),
            None => format!("None_{current_timestamp}"),
        };
        TreePath {
            path: dir.join(format!("{stem}.json")),
            legacy: dir.join(stem),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_tree_paths() {
        let paths = InventoryPaths::new(Path::new("/omd/sites/s"));

        assert_eq!(
            paths.inventory_tree("web01"),
            TreePath {
                path: PathBuf::from("/omd/sites/s/var/check_mk/inventory/web01.json"),
                legacy: PathBuf::from("/omd/sites/s/var/check_mk/inventory/web01"),
            }
        );
        assert_eq!(
            paths.inventory_tree_gz("web01").legacy,
            PathBuf::from("/omd/sites/s/var/check_mk/inventory/web01.gz")
        );
        assert_eq!(
            paths.status_data_tree("web01").path,
            PathBuf::from("/omd/sites/s/tmp/check_mk/status_data/web01.json")
        );
    }

    #[test]
    fn test_archive_and_delta_cache_paths() {
        let paths = InventoryPaths::new(Path::new("/site"));

        assert_eq!(
            paths.archive_tree("web01", 100).path,
            PathBuf::from("/site/var/check_mk/inventory_archive/web01/100.json")
        );
        assert_eq!(
            paths.delta_cache_tree("web01", Some(100), 200).legacy,
            PathBuf::from("/site/var/check_mk/inventory_delta_cache/web01/100_200")
        );
        assert_eq!(
            paths.delta_cache_tree("web01", None, 200).path,
            PathBuf::from("/site/var/check_mk/inventory_delta_cache/web01/None_200.json")
        );
    }
}
