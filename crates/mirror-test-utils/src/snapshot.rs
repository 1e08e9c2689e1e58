//! Read a whole tree back for comparisons.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Every path under `root`, relative to it. Directories are included.
pub fn relative_paths(root: &Path) -> BTreeSet<PathBuf> {
    walk(root)
        .into_iter()
        .map(|(rel, _)| rel)
        .collect()
}

/// Relative path of every file under `root` mapped to its bytes.
pub fn tree_contents(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    walk(root)
        .into_iter()
        .filter(|(_, abs)| abs.is_file())
        .map(|(rel, abs)| {
            let bytes = fs::read(&abs)
                .unwrap_or_else(|e| panic!("tree_contents: failed to read {}: {e}", abs.display()));
            (rel, bytes)
        })
        .collect()
}

fn walk(root: &Path) -> Vec<(PathBuf, PathBuf)> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir)
            .unwrap_or_else(|e| panic!("walk: failed to list {}: {e}", dir.display()));
        for entry in entries {
            let path = entry.unwrap().path();
            let rel = path.strip_prefix(root).unwrap().to_path_buf();
            if path.is_dir() {
                pending.push(path.clone());
            }
            found.push((rel, path));
        }
    }
    found
}
