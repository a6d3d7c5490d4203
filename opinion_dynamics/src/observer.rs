//! Optional hooks into the step loop for progress reporting and diagnostics.

use tracing::info;

use crate::StopReason;

/// Callbacks invoked by [`OpinionSystem`][crate::system::OpinionSystem] as it
/// runs. All methods default to no-ops.
pub trait StepObserver {
    /// Called after every committed step.
    ///
    /// `stationary` is the consecutive-unchanged counter after this step and
    /// `changed` whether any opinion moved beyond tolerance during it.
    fn on_step_end(&mut self, _step: usize, _stationary: usize, _changed: bool) {}

    /// Called once when the run stops.
    fn on_run_end(&mut self, _steps: usize, _reason: StopReason) {}
}

/// Observer that does nothing
pub struct NoopObserver;

impl StepObserver for NoopObserver {}

/// Logs the step counter and stationary streak every `interval` steps
pub struct ProgressLogger {
    interval: usize,
}

impl ProgressLogger {
    pub fn new(interval: usize) -> Self {
        ProgressLogger {
            interval: interval.max(1),
        }
    }
}

impl StepObserver for ProgressLogger {
    fn on_step_end(&mut self, step: usize, stationary: usize, _changed: bool) {
        if step % self.interval == 0 {
            info!(step, stationary, "progress");
        }
    }

    fn on_run_end(&mut self, steps: usize, reason: StopReason) {
        info!(steps, %reason, "run finished");
    }
}
