//! The mirror command: resolve settings, wire sinks, drive the scheduler

use std::sync::Arc;

use mirror_core::{
    ConsoleSink, EventSink, LogFileSink, Mirror, MirrorConfig, MultiSink, Scheduler, Settings,
};
use mirror_fs::RootLock;

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Merge the optional config file with command-line values and validate.
pub fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let base = match &cli.config {
        Some(path) => {
            tracing::debug!(config = %path.display(), "Loading config file");
            MirrorConfig::load(path)?
        }
        None => MirrorConfig::default(),
    };

    base.merge(cli.overrides())
        .resolve()
        .map_err(|e| CliError::user(format!("{e}. Run `mirror --help` for usage.")))
}

/// Console output, plus the log file when one is configured.
pub fn build_sink(settings: &Settings) -> Result<Arc<dyn EventSink>> {
    let mut sink = MultiSink::new().with(ConsoleSink);
    if let Some(log_file) = &settings.log_file {
        sink = sink.with(LogFileSink::create(log_file)?);
    }
    Ok(Arc::new(sink))
}

/// Mirror until interrupted, or for a single cycle with `once`.
///
/// A single cycle that skipped or failed entries is an error, so scripts can
/// rely on the exit status.
pub fn run_mirror(settings: Settings, once: bool) -> Result<()> {
    let lock = match RootLock::acquire(&settings.source, &settings.replica) {
        Ok(lock) => lock,
        Err(mirror_fs::Error::LockFailed { .. }) => {
            return Err(CliError::user(format!(
                "another mirror is already running for {} -> {}",
                settings.source.display(),
                settings.replica.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::debug!(lock = %lock.path().display(), "Holding root lock");

    let sink = build_sink(&settings)?;
    let mirror = Arc::new(
        Mirror::new(&settings.source, &settings.replica, sink).dry_run(settings.dry_run),
    );

    let mut scheduler = Scheduler::new(settings.interval);
    if once {
        scheduler = scheduler.with_max_cycles(1);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let outcome = runtime.block_on(async {
        let token = scheduler.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("Interrupt received, stopping after the current cycle");
                token.cancel();
            }
        });
        scheduler.run(mirror).await
    });

    tracing::debug!(cycles = outcome.cycles, unclean = outcome.unclean_cycles, "Mirror stopped");

    if once && outcome.unclean_cycles > 0 {
        return Err(CliError::user("synchronization cycle did not complete cleanly"));
    }
    Ok(())
}
