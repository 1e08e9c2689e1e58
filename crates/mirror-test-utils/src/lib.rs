//! Shared test utilities for the folder-mirror workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`]: [`TreePair`] fixture with a source and replica under one temp dir
//! - [`snapshot`]: read a whole tree back for comparisons

pub mod snapshot;
pub mod tree;

pub use snapshot::{relative_paths, tree_contents};
pub use tree::{TreePair, mtime, set_mtime};
