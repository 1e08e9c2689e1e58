//! Command implementations for mirror-cli

pub mod run;

pub use run::{resolve_settings, run_mirror};
