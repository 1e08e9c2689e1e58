//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;
use mirror_core::MirrorConfig;

/// Folder mirror - keep a replica folder identical to a source folder
///
/// Examples:
///   mirror ./original ./replica 30 ./logs/sync.log
///   mirror --config mirror.toml
///   mirror ./original ./replica 30 --once --dry-run
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source folder to mirror from
    pub source: Option<PathBuf>,

    /// Replica folder kept identical to the source
    pub replica: Option<PathBuf>,

    /// Seconds to wait between synchronization cycles
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Log file receiving a copy of every action line
    pub log_file: Option<PathBuf>,

    /// Read settings from a TOML, JSON or YAML file
    #[arg(short, long, value_name = "FILE", env = "MIRROR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Report what would change without touching the replica
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Values given on the command line, layered over the config file.
    pub fn overrides(&self) -> MirrorConfig {
        MirrorConfig {
            source: self.source.clone(),
            replica: self.replica.clone(),
            interval: self.interval,
            log_file: self.log_file.clone(),
            dry_run: self.dry_run,
        }
    }
}
