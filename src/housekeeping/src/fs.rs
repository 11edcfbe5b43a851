//! Filesystem access that tolerates concurrent writers.
//!
//! Files and directories vanishing between listing and use are expected and
//! treated as "nothing to do". Every other I/O error is returned.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use glob::{MatchOptions, Pattern};

const VISIBLE_ONLY: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Modification time in unix seconds, `None` if the file does not exist.
pub fn mtime(path: &Path) -> io::Result<Option<i64>> {
    match std::fs::metadata(path) {
        Ok(metadata) => {
            let modified: DateTime<Utc> = metadata.modified()?.into();
            Ok(Some(modified.timestamp()))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Non-directory entries of `dir`, sorted. A missing directory is empty.
pub fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        let path = entry.path();
        match std::fs::symlink_metadata(&path) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => paths.push(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    paths.sort();
    Ok(paths)
}

/// Regular files exactly `depth` levels below `dir`, skipping every
/// dot-prefixed path component.
pub fn visible_files(dir: &Path, depth: usize) -> io::Result<Vec<PathBuf>> {
    visible_entries(dir, depth, false)
}

/// Directories directly below `dir`, skipping dot-prefixed names.
pub fn visible_dirs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    visible_entries(dir, 1, true)
}

fn visible_entries(dir: &Path, depth: usize, want_dirs: bool) -> io::Result<Vec<PathBuf>> {
    let Some(dir_str) = dir.to_str() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path is not valid UTF-8: {}", dir.display()),
        ));
    };

    let mut pattern = Pattern::escape(dir_str);
    for _ in 0..depth {
        pattern.push_str("/*");
    }

    let entries = glob::glob_with(&pattern, VISIBLE_ONLY)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                let e: io::Error = e.into();
                if e.kind() == io::ErrorKind::NotFound {
                    continue;
                }
                return Err(e);
            }
        };

        let file_type = match std::fs::symlink_metadata(&path) {
            Ok(metadata) => metadata.file_type(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        if file_type.is_dir() == want_dirs {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Delete a file; a missing file is fine.
pub fn remove_file(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Remove `dir` if it is empty. Returns whether it was removed.
pub fn remove_dir_if_empty(dir: &Path) -> io::Result<bool> {
    match std::fs::remove_dir(dir) {
        Ok(()) => Ok(true),
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::DirectoryNotEmpty
            ) =>
        {
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::testing::TestSite;

    #[test]
    fn test_mtime_of_missing_file() {
        let site = TestSite::new();
        assert_eq!(mtime(&site.root().join("missing")).unwrap(), None);
    }

    #[test]
    fn test_mtime() {
        let site = TestSite::new();
        let path = site.write_file(&site.root().join("a"), 12_345);
        assert_eq!(mtime(&path).unwrap(), Some(12_345));
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let site = TestSite::new();
        assert!(list_files(&site.root().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_list_files_skips_directories() {
        let site = TestSite::new();
        let dir = site.root().join("web01");
        let file = site.write_file(&dir.join("100.json"), 100);
        std::fs::create_dir_all(dir.join("50")).unwrap();

        assert_eq!(list_files(&dir).unwrap(), vec![file]);
    }

    #[test]
    fn test_visible_files_skip_hidden() {
        let site = TestSite::new();
        let root = site.root().join("inv");
        site.write_file(&root.join("web01.json"), 1);
        site.write_file(&root.join(".last"), 1);
        site.write_file(&root.join("sub/deep.json"), 1);
        site.write_file(&root.join(".hidden/deep.json"), 1);

        assert_eq!(
            visible_files(&root, 1).unwrap(),
            vec![root.join("web01.json")]
        );
        assert_eq!(
            visible_files(&root, 2).unwrap(),
            vec![root.join("sub/deep.json")]
        );
        assert_eq!(visible_dirs(&root).unwrap(), vec![root.join("sub")]);
    }

    #[test]
    fn test_visible_files_of_missing_dir() {
        let site = TestSite::new();
        assert!(visible_files(&site.root().join("nope"), 2).unwrap().is_empty());
    }

    #[test]
    fn test_glob_metacharacters_in_root() {
        let site = TestSite::new();
        let root = site.root().join("[site]*");
        site.write_file(&root.join("web01.json"), 1);
        assert_eq!(
            visible_files(&root, 1).unwrap(),
            vec![root.join("web01.json")]
        );
    }

    #[test]
    fn test_remove_missing_file_is_ok() {
        let site = TestSite::new();
        assert!(remove_file(&site.root().join("gone")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_dir_is_an_error() {
        use std::os::unix::fs::PermissionsExt;

        let site = TestSite::new();
        let dir = site.root().join("locked");
        site.write_file(&dir.join("100.json"), 100);
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read the directory regardless of its mode.
        let privileged = std::fs::read_dir(&dir).is_ok();
        let result = list_files(&dir);
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();
        if privileged {
            return;
        }

        let err = result.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_file_propagates_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let site = TestSite::new();
        let dir = site.root().join("readonly");
        let path = site.write_file(&dir.join("100.json"), 100);
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o555)).unwrap();

        let privileged = std::fs::write(dir.join("write-check"), b"").is_ok();
        let result = remove_file(&path);
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();
        if privileged {
            return;
        }

        let err = result.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(path.exists());
    }

    #[test]
    fn test_remove_dir_if_empty() {
        let site = TestSite::new();
        let dir = site.root().join("d");
        site.write_file(&dir.join("f"), 1);

        assert!(!remove_dir_if_empty(&dir).unwrap());
        remove_file(&dir.join("f")).unwrap();
        assert!(remove_dir_if_empty(&dir).unwrap());
        assert!(!remove_dir_if_empty(&dir).unwrap());
    }
}
