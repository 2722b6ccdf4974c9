//! Periodic capture monitor.
//!
//! A single task ticks on an interval and runs one [`Importer::poll`] per
//! tick. Every cycle finishes before the next tick is taken, so the ledger
//! and transcript need no locking.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

use crate::importer::{ImportOutcome, Importer};
use crate::source::CaptureSource;

pub const DEFAULT_INTERVAL_SECS: u64 = 10;
pub const MIN_INTERVAL_SECS: u64 = 5;
pub const MAX_INTERVAL_SECS: u64 = 60;

/// Clamp a configured interval into the supported range.
pub fn clamp_interval(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS))
}

/// Running totals for a monitor or watcher session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: usize,
    /// Turns written across all cycles.
    pub imported: usize,
    pub failed: usize,
}

impl CycleStats {
    pub fn record(&mut self, outcome: &ImportOutcome) {
        self.cycles += 1;
        self.imported += outcome.added();
        if matches!(outcome, ImportOutcome::Failed(_)) {
            self.failed += 1;
        }
    }
}

/// Polls a capture source until cancelled.
#[derive(Debug, Clone)]
pub struct Monitor {
    interval: Duration,
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_SECS)
    }
}

impl Monitor {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval: clamp_interval(interval_secs),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until `shutdown` is cancelled. The first poll happens immediately.
    pub async fn run<S>(
        &self,
        importer: &mut Importer,
        source: &mut S,
        shutdown: CancellationToken,
    ) -> CycleStats
    where
        S: CaptureSource + ?Sized,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stats = CycleStats::default();

        info!(
            source = source.name(),
            interval_secs = self.interval.as_secs(),
            "Capture monitor started"
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Capture monitor received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    let outcome = importer.poll(source);
                    trace!(?outcome, "Monitor cycle complete");
                    stats.record(&outcome);
                }
            }
        }

        info!(
            cycles = stats.cycles,
            imported = stats.imported,
            "Capture monitor stopped"
        );
        stats
    }
}
