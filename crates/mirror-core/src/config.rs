//! Runtime configuration
//!
//! Values come from an optional config file and from the command line; the
//! command line wins. [`MirrorConfig::resolve`] validates the merged result.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Partially specified configuration, as read from a file or arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorConfig {
    pub source: Option<PathBuf>,
    pub replica: Option<PathBuf>,
    /// Seconds between the end of one cycle and the start of the next
    pub interval: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub dry_run: bool,
}

/// Validated configuration the driver runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source: PathBuf,
    pub replica: PathBuf,
    pub interval: Duration,
    pub log_file: Option<PathBuf>,
    pub dry_run: bool,
}

impl MirrorConfig {
    /// Load from a TOML, JSON or YAML file, chosen by extension.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(mirror_fs::load_config(path)?)
    }

    /// Layer `overrides` on top of `self`.
    pub fn merge(self, overrides: MirrorConfig) -> Self {
        Self {
            source: overrides.source.or(self.source),
            replica: overrides.replica.or(self.replica),
            interval: overrides.interval.or(self.interval),
            log_file: overrides.log_file.or(self.log_file),
            dry_run: overrides.dry_run || self.dry_run,
        }
    }

    /// Check that every required value is present and sane.
    ///
    /// The source does not need to exist yet; a missing source only skips
    /// cycles until it appears.
    pub fn resolve(self) -> Result<Settings> {
        let source = self
            .source
            .ok_or_else(|| Error::invalid_config("source folder is required"))?;
        let replica = self
            .replica
            .ok_or_else(|| Error::invalid_config("replica folder is required"))?;
        let interval = match self.interval {
            Some(0) => return Err(Error::invalid_config("interval must be a positive number of seconds")),
            Some(secs) => Duration::from_secs(secs),
            None => return Err(Error::invalid_config("interval is required")),
        };

        check_disjoint(&source, &replica)?;

        Ok(Settings {
            source,
            replica,
            interval,
            log_file: self.log_file,
            dry_run: self.dry_run,
        })
    }
}

/// Reject root pairs where one tree contains the other.
///
/// A replica inside the source would be copied into itself every cycle; a
/// source inside the replica would be pruned by the reverse pass.
fn check_disjoint(source: &Path, replica: &Path) -> Result<()> {
    let source_abs = mirror_fs::io::resolve_path(source);
    let replica_abs = mirror_fs::io::resolve_path(replica);

    if source_abs == replica_abs {
        return Err(Error::invalid_config(format!(
            "source and replica are the same folder: {}",
            source.display()
        )));
    }
    if replica_abs.starts_with(&source_abs) {
        return Err(Error::invalid_config(format!(
            "replica {} is inside source {}",
            replica.display(),
            source.display()
        )));
    }
    if source_abs.starts_with(&replica_abs) {
        return Err(Error::invalid_config(format!(
            "source {} is inside replica {}",
            source.display(),
            replica.display()
        )));
    }
    Ok(())
}
