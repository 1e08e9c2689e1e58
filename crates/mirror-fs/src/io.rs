//! Directory listing, atomic copies and removal

use std::ffi::OsString;
use std::fs::{self, Metadata};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use crate::{Error, Result};

/// What a path resolves to after following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Dir,
    /// Sockets, fifos, devices and dangling symlinks
    Other,
}

impl EntryKind {
    fn from_metadata(meta: &Metadata) -> Self {
        if meta.is_dir() {
            Self::Dir
        } else if meta.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }

    pub fn is_dir(self) -> bool {
        self == Self::Dir
    }

    pub fn is_file(self) -> bool {
        self == Self::File
    }
}

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: OsString,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Classify `path`, following symlinks.
///
/// Returns `Ok(None)` when nothing exists there (including a dangling symlink).
pub fn entry_kind(path: &Path) -> Result<Option<EntryKind>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(EntryKind::from_metadata(&meta))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Classify whatever occupies `path`.
///
/// Same as [`entry_kind`], except that a dangling symlink is reported as
/// [`EntryKind::Other`] since the link itself still takes up the name.
pub fn occupant_kind(path: &Path) -> Result<Option<EntryKind>> {
    match entry_kind(path)? {
        Some(kind) => Ok(Some(kind)),
        None => match fs::symlink_metadata(path) {
            Ok(_) => Ok(Some(EntryKind::Other)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(path, e)),
        },
    }
}

/// List the immediate children of `dir`, sorted by name.
///
/// Children that cannot be stat'ed are reported as [`EntryKind::Other`].
pub fn list_dir(dir: &Path) -> Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        let kind = match fs::metadata(&path) {
            Ok(meta) => EntryKind::from_metadata(&meta),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Cannot stat entry");
                EntryKind::Other
            }
        };
        entries.push(DirEntry {
            name: entry.file_name(),
            path,
            kind,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Last modification time of `path`.
pub fn modified(path: &Path) -> Result<FileTime> {
    let meta = fs::metadata(path).map_err(|e| Error::io(path, e))?;
    Ok(FileTime::from_last_modification_time(&meta))
}

/// Create a single directory. The parent must already exist.
pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir(path).map_err(|e| Error::io(path, e))
}

/// Create a directory and any missing parents.
pub fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

/// Absolute, symlink-free form of `path` where it can be resolved.
///
/// A path that does not exist yet is resolved through its parent, and
/// returned unchanged when neither resolves.
pub fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = dunce::canonicalize(path) {
        return resolved;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            dunce::canonicalize(parent)
                .map(|p| p.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}

/// Copy `src` over `dst`, carrying the source's access and modification times.
///
/// The content lands in a temporary sibling of `dst` first and is renamed into
/// place, so a failed copy never leaves `dst` half-written.
pub fn copy_atomic(src: &Path, dst: &Path) -> Result<()> {
    let meta = fs::metadata(src).map_err(|e| Error::io(src, e))?;
    let temp_path = temp_sibling(dst);

    if let Err(e) = copy_with_times(src, &temp_path, &meta) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, dst).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::io(dst, e)
    })
}

fn copy_with_times(src: &Path, temp_path: &Path, meta: &Metadata) -> Result<()> {
    fs::copy(src, temp_path).map_err(|e| Error::io(src, e))?;
    filetime::set_file_times(
        temp_path,
        FileTime::from_last_access_time(meta),
        FileTime::from_last_modification_time(meta),
    )
    .map_err(|e| Error::io(temp_path, e))
}

/// Temp file path in the same directory as `dst` (same filesystem for rename).
fn temp_sibling(dst: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        dst.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    dst.with_file_name(temp_name)
}

/// Remove `path`; directories are removed with their whole subtree.
///
/// A symlink is removed itself, never its target.
pub fn remove_entry(path: &Path, kind: EntryKind) -> Result<()> {
    let result = match kind {
        EntryKind::Dir => match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => fs::remove_file(path),
            _ => fs::remove_dir_all(path),
        },
        EntryKind::File | EntryKind::Other => fs::remove_file(path),
    };
    result.map_err(|e| Error::io(path, e))
}
