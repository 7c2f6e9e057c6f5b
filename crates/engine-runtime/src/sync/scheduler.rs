use crate::{
    error::SyncError,
    sync::cycle::{CycleReport, PushCycle},
};
use chrono::NaiveDateTime;
use engine_core::activation::{ActivationTime, local_now, next_activation, wait_until};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Runs push cycles forever: the first one right away, every later one at
/// the daily activation time.
pub struct SyncLoop {
    cycle: PushCycle,
    activation: ActivationTime,
    clock: fn() -> NaiveDateTime,
}

impl SyncLoop {
    pub fn new(cycle: PushCycle, activation: ActivationTime) -> Self {
        SyncLoop {
            cycle,
            activation,
            clock: local_now,
        }
    }

    /// Replaces the wall clock used to schedule activations.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Returns `Ok` once `cancel` fires. A failure of the very first cycle
    /// is returned as is; later failures are logged and the cycle skipped.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), SyncError> {
        let mut first = true;

        loop {
            if !first && !self.await_activation(&cancel).await {
                return Ok(());
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Sync loop cancelled during a cycle");
                    return Ok(());
                }
                outcome = self.cycle.run() => outcome,
            };

            settle_cycle(outcome, first)?;
            first = false;
        }
    }

    /// Sleeps until the next activation. `false` when cancelled first.
    async fn await_activation(&self, cancel: &CancellationToken) -> bool {
        let now = (self.clock)();
        let target = next_activation(now, self.activation);
        info!(next = %target, "Waiting for next activation");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Sync loop cancelled while waiting");
                false
            }
            _ = tokio::time::sleep(wait_until(now, target)) => true,
        }
    }
}

/// Applies the cycle failure policy: fatal on the first cycle, logged and
/// skipped afterwards.
pub fn settle_cycle(
    outcome: Result<CycleReport, SyncError>,
    first: bool,
) -> Result<Option<CycleReport>, SyncError> {
    match outcome {
        Ok(report) => Ok(Some(report)),
        Err(err) if first => Err(err),
        Err(err) => {
            error!(error = %err, "Sync cycle failed, skipping until next activation");
            Ok(None)
        }
    }
}
