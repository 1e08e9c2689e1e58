//! [`TreePair`] fixture for mirroring scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use filetime::{FileTime, set_file_mtime};
use tempfile::TempDir;

/// A temporary directory holding `source/` and a not-yet-created `replica/`.
///
/// # Example
///
/// ```rust,no_run
/// use mirror_test_utils::TreePair;
///
/// let pair = TreePair::new();
/// pair.write_source("nested/inner.txt", "content");
/// assert!(!pair.replica().exists());
/// ```
pub struct TreePair {
    temp_dir: TempDir,
    source: PathBuf,
    replica: PathBuf,
}

impl Default for TreePair {
    fn default() -> Self {
        Self::new()
    }
}

impl TreePair {
    /// Create the temp dir and an empty `source/`. The replica is left absent.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source");
        let replica = temp_dir.path().join("replica");
        fs::create_dir(&source)
            .unwrap_or_else(|e| panic!("TreePair::new: failed to create source: {e}"));
        Self {
            temp_dir,
            source,
            replica,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn replica(&self) -> &Path {
        &self.replica
    }

    pub fn source_path(&self, rel: &str) -> PathBuf {
        self.source.join(rel)
    }

    pub fn replica_path(&self, rel: &str) -> PathBuf {
        self.replica.join(rel)
    }

    /// Write a source file, creating parent directories.
    pub fn write_source(&self, rel: &str, content: impl AsRef<[u8]>) -> PathBuf {
        write_file(&self.source_path(rel), content.as_ref())
    }

    /// Write a replica file, creating parent directories (and the replica root).
    pub fn write_replica(&self, rel: &str, content: impl AsRef<[u8]>) -> PathBuf {
        write_file(&self.replica_path(rel), content.as_ref())
    }

    pub fn mkdir_source(&self, rel: &str) -> PathBuf {
        let path = self.source_path(rel);
        fs::create_dir_all(&path)
            .unwrap_or_else(|e| panic!("mkdir_source: failed to create {}: {e}", path.display()));
        path
    }

    pub fn mkdir_replica(&self, rel: &str) -> PathBuf {
        let path = self.replica_path(rel);
        fs::create_dir_all(&path)
            .unwrap_or_else(|e| panic!("mkdir_replica: failed to create {}: {e}", path.display()));
        path
    }

    pub fn read_replica(&self, rel: &str) -> String {
        let path = self.replica_path(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("read_replica: failed to read {}: {e}", path.display()))
    }

    pub fn remove_source(&self, rel: &str) {
        let path = self.source_path(rel);
        if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        }
        .unwrap_or_else(|e| panic!("remove_source: failed to remove {}: {e}", path.display()));
    }

    pub fn assert_replica_exists(&self, rel: &str) {
        let path = self.replica_path(rel);
        assert!(path.exists(), "Expected replica entry to exist: {}", path.display());
    }

    pub fn assert_replica_missing(&self, rel: &str) {
        let path = self.replica_path(rel);
        assert!(!path.exists(), "Expected replica entry to be absent: {}", path.display());
    }
}

fn write_file(path: &Path, content: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("write_file: failed to create {}: {e}", parent.display()));
    }
    fs::write(path, content)
        .unwrap_or_else(|e| panic!("write_file: failed to write {}: {e}", path.display()));
    path.to_path_buf()
}

/// Set the modification time of `path` to `secs` after the Unix epoch.
pub fn set_mtime(path: &Path, secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(secs, 0))
        .unwrap_or_else(|e| panic!("set_mtime: failed for {}: {e}", path.display()));
}

/// Modification time of `path` in whole seconds since the Unix epoch.
pub fn mtime(path: &Path) -> i64 {
    let meta = fs::metadata(path)
        .unwrap_or_else(|e| panic!("mtime: failed to stat {}: {e}", path.display()));
    FileTime::from_last_modification_time(&meta).unix_seconds()
}
