//! The mirror engine
//!
//! One reconciliation pass walks the source tree depth-first using an explicit
//! stack of directory pairs. At every level the forward pass creates and
//! updates replica entries, then the reverse pass removes replica entries with
//! no source counterpart. Entries created by the forward pass therefore always
//! have a counterpart when the reverse pass of the same level runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mirror_fs::io::{self, DirEntry, EntryKind};

use crate::event::{ActionKind, ActionRecord, Event, EventSink, FailureRecord};
use crate::report::CycleReport;
use crate::{Error, Operation, Result};

/// Classification of one (source entry, replica entry) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    CreateDir,
    CreateFile,
    UpdateFile,
    RecurseIntoDir,
    DeleteDir,
    DeleteFile,
    NoOp,
}

impl Decision {
    /// Forward-pass decision for a source entry, given what the replica holds
    /// under the same name.
    ///
    /// `source_is_newer` only matters when both sides are files; equal
    /// modification times are treated as in sync. A replica entry of another
    /// kind counts as absent (it has to be removed first, see
    /// [`Decision::conflicting`]).
    pub fn for_source(source: EntryKind, replica: Option<EntryKind>, source_is_newer: bool) -> Self {
        match (source, replica) {
            (EntryKind::Dir, Some(EntryKind::Dir)) => Self::RecurseIntoDir,
            (EntryKind::Dir, _) => Self::CreateDir,
            (EntryKind::File, Some(EntryKind::File)) if source_is_newer => Self::UpdateFile,
            (EntryKind::File, Some(EntryKind::File)) => Self::NoOp,
            (EntryKind::File, _) => Self::CreateFile,
            (EntryKind::Other, _) => Self::NoOp,
        }
    }

    /// Reverse-pass decision for a replica entry.
    pub fn for_replica(replica: EntryKind, source_exists: bool) -> Self {
        match (replica, source_exists) {
            (_, true) => Self::NoOp,
            (EntryKind::Dir, false) => Self::DeleteDir,
            (_, false) => Self::DeleteFile,
        }
    }

    /// Kind of the replica entry that is in the way of the source entry.
    pub fn conflicting(source: EntryKind, replica: Option<EntryKind>) -> Option<EntryKind> {
        match (source, replica) {
            (EntryKind::Other, _) | (_, None) => None,
            (source, Some(replica)) if source == replica => None,
            (_, Some(replica)) => Some(replica),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelMode {
    /// Replica directory exists: compare, report and prune
    Reconcile,
    /// Replica directory was created this cycle and is empty: copy without records
    Populate,
    /// Replica directory does not exist (dry run): everything is absent
    Preview,
}

#[derive(Debug)]
struct Level {
    source: PathBuf,
    replica: PathBuf,
    mode: LevelMode,
}

/// Mirrors one source root into one replica root.
///
/// The engine holds no state between calls to [`Mirror::reconcile`]; every
/// cycle derives the tree from scratch.
pub struct Mirror {
    source: PathBuf,
    replica: PathBuf,
    sink: Arc<dyn EventSink>,
    dry_run: bool,
}

impl Mirror {
    pub fn new(source: impl Into<PathBuf>, replica: impl Into<PathBuf>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
            sink,
            dry_run: false,
        }
    }

    /// Report what would change without touching the replica.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn replica(&self) -> &Path {
        &self.replica
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run one reconciliation pass.
    ///
    /// Per-entry failures are emitted to the sink, collected in the report and
    /// do not stop sibling entries from being processed.
    ///
    /// # Errors
    ///
    /// Fails without mutating anything when the source root is missing or not
    /// a directory, or when the replica root cannot be prepared.
    pub fn reconcile(&self) -> Result<CycleReport> {
        let mut pass = Pass {
            sink: self.sink.as_ref(),
            dry_run: self.dry_run,
            report: CycleReport::new(self.dry_run),
        };

        let mode = pass.prepare_roots(&self.source, &self.replica)?;
        let mut stack = vec![Level {
            source: self.source.clone(),
            replica: self.replica.clone(),
            mode,
        }];
        while let Some(level) = stack.pop() {
            pass.visit(level, &mut stack);
        }

        tracing::debug!(summary = %pass.report.summary(), "Reconciliation pass finished");
        Ok(pass.report)
    }
}

/// State of a single reconciliation pass.
struct Pass<'a> {
    sink: &'a dyn EventSink,
    dry_run: bool,
    report: CycleReport,
}

impl Pass<'_> {
    fn prepare_roots(&mut self, source: &Path, replica: &Path) -> Result<LevelMode> {
        match io::entry_kind(source) {
            Ok(Some(EntryKind::Dir)) => {}
            Ok(Some(_)) => {
                return Err(self.fatal(Error::SourceNotDirectory {
                    path: source.to_path_buf(),
                }));
            }
            Ok(None) => {
                return Err(self.fatal(Error::SourceMissing {
                    path: source.to_path_buf(),
                }));
            }
            Err(e) => return Err(self.fatal(Error::entry(Operation::Inspect, source, e))),
        }

        match io::entry_kind(replica) {
            Ok(Some(EntryKind::Dir)) => Ok(LevelMode::Reconcile),
            Ok(Some(_)) => Err(self.fatal(Error::ReplicaNotDirectory {
                path: replica.to_path_buf(),
            })),
            Ok(None) => {
                if !self.dry_run {
                    if let Err(e) = io::create_dir_all(replica) {
                        return Err(self.fatal(Error::entry(Operation::CreateReplicaRoot, replica, e)));
                    }
                }
                self.record(ActionRecord::new(ActionKind::ReplicaRootCreated, replica));
                Ok(if self.dry_run {
                    LevelMode::Preview
                } else {
                    LevelMode::Reconcile
                })
            }
            Err(e) => Err(self.fatal(Error::entry(Operation::Inspect, replica, e))),
        }
    }

    fn visit(&mut self, level: Level, stack: &mut Vec<Level>) {
        let children = match io::list_dir(&level.source) {
            Ok(children) => children,
            Err(e) => {
                // Without a listing the reverse pass would prune everything.
                self.fail(Error::entry(Operation::List, &level.source, e));
                return;
            }
        };

        let mut nested = Vec::new();
        for child in &children {
            self.forward(&level, child, &mut nested);
        }
        if level.mode == LevelMode::Reconcile {
            self.prune(&level);
        }

        stack.extend(nested.into_iter().rev());
    }

    fn forward(&mut self, level: &Level, child: &DirEntry, nested: &mut Vec<Level>) {
        let target = level.replica.join(&child.name);
        let existing = match level.mode {
            LevelMode::Reconcile => match io::occupant_kind(&target) {
                Ok(kind) => kind,
                Err(e) => {
                    self.fail(Error::entry(Operation::Inspect, &target, e));
                    return;
                }
            },
            LevelMode::Populate | LevelMode::Preview => None,
        };

        if let Some(stale) = Decision::conflicting(child.kind, existing) {
            if !self.remove(&target, stale) {
                return;
            }
        }
        let existing = existing.filter(|kind| *kind == child.kind);

        let source_is_newer = match (child.kind, existing) {
            (EntryKind::File, Some(EntryKind::File)) => {
                match self.source_is_newer(&child.path, &target) {
                    Ok(newer) => newer,
                    Err(e) => {
                        self.fail(e);
                        return;
                    }
                }
            }
            _ => false,
        };

        let loud = level.mode != LevelMode::Populate;
        let decision = Decision::for_source(child.kind, existing, source_is_newer);
        match decision {
            Decision::RecurseIntoDir => nested.push(Level {
                source: child.path.clone(),
                replica: target,
                mode: LevelMode::Reconcile,
            }),
            Decision::CreateDir => {
                if !self.apply(Operation::CreateDir, &target, || io::create_dir(&target)) {
                    return;
                }
                if loud {
                    self.record(ActionRecord::new(ActionKind::DirCreated, &target));
                }
                if !self.dry_run {
                    nested.push(Level {
                        source: child.path.clone(),
                        replica: target,
                        mode: LevelMode::Populate,
                    });
                }
            }
            Decision::CreateFile | Decision::UpdateFile => {
                let copied = self.apply(Operation::Copy, &target, || {
                    io::copy_atomic(&child.path, &target)
                });
                if copied && loud {
                    let kind = if decision == Decision::CreateFile {
                        ActionKind::FileCreated
                    } else {
                        ActionKind::FileUpdated
                    };
                    self.record(ActionRecord::new(kind, &target).with_source(&child.path));
                }
            }
            Decision::NoOp => {
                if child.kind == EntryKind::Other {
                    tracing::debug!(
                        path = %child.path.display(),
                        "Skipping entry that is neither a file nor a directory"
                    );
                }
            }
            // Only produced by the reverse pass
            Decision::DeleteDir | Decision::DeleteFile => {}
        }
    }

    fn prune(&mut self, level: &Level) {
        let children = match io::list_dir(&level.replica) {
            Ok(children) => children,
            Err(e) => {
                self.fail(Error::entry(Operation::List, &level.replica, e));
                return;
            }
        };

        for child in children {
            let counterpart = level.source.join(&child.name);
            let source_exists = match io::entry_kind(&counterpart) {
                Ok(kind) => kind.is_some(),
                Err(e) => {
                    self.fail(Error::entry(Operation::Inspect, &counterpart, e));
                    continue;
                }
            };

            match Decision::for_replica(child.kind, source_exists) {
                Decision::DeleteDir | Decision::DeleteFile => {
                    self.remove(&child.path, child.kind);
                }
                _ => {}
            }
        }
    }

    fn source_is_newer(&self, source: &Path, replica: &Path) -> Result<bool> {
        let source_time =
            io::modified(source).map_err(|e| Error::entry(Operation::Inspect, source, e))?;
        let replica_time =
            io::modified(replica).map_err(|e| Error::entry(Operation::Inspect, replica, e))?;
        Ok(source_time > replica_time)
    }

    fn remove(&mut self, path: &Path, kind: EntryKind) -> bool {
        if !self.apply(Operation::Remove, path, || io::remove_entry(path, kind)) {
            return false;
        }
        let action = if kind.is_dir() {
            ActionKind::DirRemoved
        } else {
            ActionKind::FileRemoved
        };
        self.record(ActionRecord::new(action, path));
        true
    }

    /// Run `mutate` unless this is a dry run. Returns false once the failure
    /// has been reported.
    fn apply(
        &mut self,
        operation: Operation,
        path: &Path,
        mutate: impl FnOnce() -> mirror_fs::Result<()>,
    ) -> bool {
        if self.dry_run {
            return true;
        }
        match mutate() {
            Ok(()) => true,
            Err(e) => {
                self.fail(Error::entry(operation, path, e));
                false
            }
        }
    }

    fn record(&mut self, record: ActionRecord) {
        self.report.note(record.kind);
        self.sink.emit(&Event::Action(record));
    }

    fn fail(&mut self, error: Error) {
        tracing::debug!(error = %error, "Entry failed");
        let record = FailureRecord::from_error(&error);
        self.sink.emit(&Event::Failure(record.clone()));
        self.report.failures.push(record);
    }

    /// Report an error that ends the cycle before any mutation.
    fn fatal(&self, error: Error) -> Error {
        tracing::debug!(error = %error, "Reconciliation cycle skipped");
        self.sink.emit(&Event::Failure(FailureRecord::from_error(&error)));
        error
    }
}
