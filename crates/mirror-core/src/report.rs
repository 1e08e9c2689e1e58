//! Per-cycle summary of what the engine did

use serde::{Deserialize, Serialize};

use crate::event::{ActionKind, FailureRecord};
use crate::{Error, Result};

/// Counts of emitted action records and every failure of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Nothing was mutated; records describe what would have happened
    pub dry_run: bool,
    pub replica_root_created: bool,
    pub dirs_created: usize,
    pub dirs_removed: usize,
    pub files_created: usize,
    pub files_updated: usize,
    pub files_removed: usize,
    pub failures: Vec<FailureRecord>,
}

impl CycleReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub(crate) fn note(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::ReplicaRootCreated => self.replica_root_created = true,
            ActionKind::DirCreated => self.dirs_created += 1,
            ActionKind::DirRemoved => self.dirs_removed += 1,
            ActionKind::FileCreated => self.files_created += 1,
            ActionKind::FileUpdated => self.files_updated += 1,
            ActionKind::FileRemoved => self.files_removed += 1,
        }
    }

    /// Number of action records emitted during the cycle.
    pub fn total_actions(&self) -> usize {
        usize::from(self.replica_root_created)
            + self.dirs_created
            + self.dirs_removed
            + self.files_created
            + self.files_updated
            + self.files_removed
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Collapse into a single outcome: `Err(Incomplete)` if anything failed.
    pub fn into_result(self) -> Result<Self> {
        if self.is_clean() {
            Ok(self)
        } else {
            Err(Error::Incomplete {
                failures: self.failures.len(),
            })
        }
    }

    pub fn summary(&self) -> String {
        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        format!(
            "{prefix}{} dirs created, {} files created, {} files updated, {} removed, {} failed",
            self.dirs_created,
            self.files_created,
            self.files_updated,
            self.dirs_removed + self.files_removed,
            self.failures.len()
        )
    }
}
