//! Driver loop: one cycle, wait, repeat
//!
//! Cycles run strictly one after another on the blocking pool, so two passes
//! over the same root pair never overlap. Cancellation interrupts the wait
//! between cycles, never a pass in progress.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::engine::Mirror;

/// What a finished [`Scheduler::run`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerOutcome {
    pub cycles: u64,
    /// Cycles that were skipped or finished with failed entries
    pub unclean_cycles: u64,
}

/// Runs a [`Mirror`] on a fixed interval until cancelled.
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    max_cycles: Option<u64>,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_cycles: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop after `max_cycles` cycles instead of running forever.
    pub fn with_max_cycles(mut self, max_cycles: u64) -> Self {
        self.max_cycles = Some(max_cycles);
        self
    }

    /// Token that stops the loop at the next wait.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drive `mirror` until cancelled or the cycle limit is reached.
    ///
    /// No cycle failure ends the loop; the next tick retries from scratch.
    pub async fn run(&self, mirror: Arc<Mirror>) -> SchedulerOutcome {
        let mut outcome = SchedulerOutcome::default();
        tracing::debug!(
            source = %mirror.source().display(),
            replica = %mirror.replica().display(),
            dry_run = mirror.is_dry_run(),
            interval = ?self.interval,
            "Scheduler started"
        );

        while !self.cancel.is_cancelled() {
            outcome.cycles += 1;
            let cycle = outcome.cycles;
            tracing::debug!(cycle, "Starting reconciliation cycle");

            let pass = Arc::clone(&mirror);
            match tokio::task::spawn_blocking(move || pass.reconcile()).await {
                Ok(Ok(report)) if report.is_clean() => {
                    tracing::debug!(cycle, summary = %report.summary(), "Cycle finished");
                }
                Ok(Ok(report)) => {
                    outcome.unclean_cycles += 1;
                    tracing::warn!(cycle, summary = %report.summary(), "Cycle finished with failures");
                }
                Ok(Err(e)) => {
                    outcome.unclean_cycles += 1;
                    tracing::warn!(cycle, error = %e, "Cycle skipped");
                }
                Err(e) => {
                    outcome.unclean_cycles += 1;
                    tracing::error!(cycle, error = %e, "Cycle task did not complete");
                }
            }

            if self.max_cycles.is_some_and(|max| outcome.cycles >= max) {
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::debug!(cycles = outcome.cycles, "Scheduler stopped");
        outcome
    }
}
