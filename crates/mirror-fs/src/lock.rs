//! Exclusive lock over a (source, replica) root pair
//!
//! The lock file lives in the system temp directory so it never appears in
//! either tree. Its name is derived from a SHA-256 digest of the canonical
//! root paths.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use sha2::{Digest, Sha256};

use crate::io::resolve_path;
use crate::{Error, Result};

/// Number of hex digits of the pair digest used in the lock file name
const KEY_LEN: usize = 16;

/// Held for as long as one driver owns a root pair. Released on drop.
#[derive(Debug)]
pub struct RootLock {
    file: File,
    path: PathBuf,
}

impl RootLock {
    /// Try to take the lock for `source` and `replica` without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockFailed`] if another holder owns the pair.
    pub fn acquire(source: &Path, replica: &Path) -> Result<Self> {
        Self::acquire_in(&std::env::temp_dir(), source, replica)
    }

    /// Like [`RootLock::acquire`] with an explicit directory for the lock file.
    pub fn acquire_in(lock_dir: &Path, source: &Path, replica: &Path) -> Result<Self> {
        let path = lock_dir.join(format!("mirror-{}.lock", pair_key(source, replica)));

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;

        file.try_lock_exclusive()
            .map_err(|_| Error::LockFailed { path: path.clone() })?;

        tracing::debug!(lock = %path.display(), "Acquired root-pair lock");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RootLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Stable key for a root pair.
///
/// Both roots go through [`resolve_path`], so `./a` and `/abs/a` share a
/// key even before the replica exists.
pub fn pair_key(source: &Path, replica: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(resolve_path(source).to_string_lossy().as_bytes());
    hasher.update([0u8]);
    hasher.update(resolve_path(replica).to_string_lossy().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..KEY_LEN].to_string()
}
