//! Action records and the sink they are emitted to
//!
//! The engine never writes logs itself. Each mutation becomes an
//! [`ActionRecord`] and each failure a [`FailureRecord`]; both reach the
//! injected [`EventSink`] the moment they happen.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Timestamp layout used in rendered log lines
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Kind of mutation applied to the replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    ReplicaRootCreated,
    DirCreated,
    DirRemoved,
    FileCreated,
    FileUpdated,
    FileRemoved,
}

impl ActionKind {
    /// `FileCreated` and `FileUpdated` are both a copy from the source.
    pub fn is_file_copy(self) -> bool {
        matches!(self, Self::FileCreated | Self::FileUpdated)
    }

    pub fn is_removal(self) -> bool {
        matches!(self, Self::DirRemoved | Self::FileRemoved)
    }
}

/// One mutation performed during a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub timestamp: DateTime<Local>,
    pub kind: ActionKind,
    /// Affected replica path
    pub path: PathBuf,
    /// Source path the content came from, for file copies
    pub source: Option<PathBuf>,
}

impl ActionRecord {
    pub fn new(kind: ActionKind, path: impl Into<PathBuf>) -> Self {
        Self {
            timestamp: Local::now(),
            kind,
            path: path.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn message(&self) -> String {
        let path = self.path.display();
        match self.kind {
            ActionKind::ReplicaRootCreated => format!("Replica folder created: {path}"),
            ActionKind::DirCreated => format!("Directory created: {path}"),
            ActionKind::DirRemoved => format!("Directory removed: {path}"),
            ActionKind::FileRemoved => format!("File removed: {path}"),
            ActionKind::FileCreated | ActionKind::FileUpdated => {
                let verb = if self.kind == ActionKind::FileCreated {
                    "created"
                } else {
                    "updated"
                };
                match &self.source {
                    Some(source) => format!("File {verb}: {} -> {path}", source.display()),
                    None => format!("File {verb}: {path}"),
                }
            }
        }
    }
}

/// A failure reported during a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub timestamp: DateTime<Local>,
    pub path: Option<PathBuf>,
    pub message: String,
}

impl FailureRecord {
    pub fn from_error(error: &Error) -> Self {
        Self {
            timestamp: Local::now(),
            path: error.path().map(Path::to_path_buf),
            message: error.to_string(),
        }
    }
}

/// Everything an [`EventSink`] can receive.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Action(ActionRecord),
    Failure(FailureRecord),
}

impl Event {
    pub fn timestamp(&self) -> DateTime<Local> {
        match self {
            Self::Action(record) => record.timestamp,
            Self::Failure(record) => record.timestamp,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Action(record) => record.message(),
            Self::Failure(record) => record.message.clone(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Render as `<timestamp> - <message>`.
    pub fn to_line(&self) -> String {
        format!("{} - {}", self.timestamp().format(TIMESTAMP_FORMAT), self.message())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Destination for action and failure events.
///
/// Implementations must tolerate being called from the blocking thread the
/// engine runs on.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &Event);
}
