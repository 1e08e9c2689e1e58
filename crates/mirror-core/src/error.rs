//! Error types for mirror-core

use std::fmt;
use std::path::{Path, PathBuf};

/// Result type for mirror-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Filesystem step that failed for a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Inspect,
    List,
    CreateDir,
    CreateReplicaRoot,
    Copy,
    Remove,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Inspect => "inspect",
            Self::List => "list",
            Self::CreateDir => "create directory",
            Self::CreateReplicaRoot => "create replica folder",
            Self::Copy => "copy",
            Self::Remove => "remove",
        };
        f.write_str(verb)
    }
}

/// Errors that can occur while mirroring
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source root does not exist; the cycle is skipped
    #[error("Source folder doesn't exist: {}", .path.display())]
    SourceMissing { path: PathBuf },

    #[error("Source is not a directory: {}", .path.display())]
    SourceNotDirectory { path: PathBuf },

    #[error("Replica exists but is not a directory: {}", .path.display())]
    ReplicaNotDirectory { path: PathBuf },

    /// A single entry could not be processed
    #[error("Failed to {operation} {}: {}", .path.display(), .source.cause())]
    Entry {
        operation: Operation,
        path: PathBuf,
        #[source]
        source: mirror_fs::Error,
    },

    /// The cycle ran to the end but some entries failed
    #[error("Cycle finished with {failures} failed entries")]
    Incomplete { failures: usize },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),
}

impl Error {
    pub fn entry(operation: Operation, path: impl Into<PathBuf>, source: mirror_fs::Error) -> Self {
        Self::Entry {
            operation,
            path: path.into(),
            source,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Path the error is about, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::SourceMissing { path }
            | Self::SourceNotDirectory { path }
            | Self::ReplicaNotDirectory { path }
            | Self::Entry { path, .. } => Some(path),
            _ => None,
        }
    }
}
