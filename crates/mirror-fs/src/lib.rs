//! Filesystem primitives for the folder mirror
//!
//! Provides entry classification, sorted directory listing, atomic
//! mtime-preserving copies, config-file loading and the root-pair lock.

pub mod config;
pub mod error;
pub mod io;
pub mod lock;

pub use config::{ConfigFormat, load_config};
pub use error::{Error, Result};
pub use io::{DirEntry, EntryKind};
pub use lock::RootLock;
