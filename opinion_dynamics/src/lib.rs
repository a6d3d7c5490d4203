pub mod agent;
pub mod analysis;
pub mod convergence;
pub mod error;
pub mod network;
pub mod observer;
pub mod output;
pub mod params;
pub mod system;
pub mod trajectory;
pub mod update;

use des::EventLoop;
use serde::{Deserialize, Serialize};

pub use agent::{AgentPool, OpinionAgent};
pub use convergence::{ConvergenceDetector, OPINION_EPSILON};
pub use error::{ConfigError, SimError, SimResult};
pub use network::{Network, RandomGraphBuilder};
pub use observer::{NoopObserver, ProgressLogger, StepObserver};
pub use params::SimulationParams;
pub use system::OpinionSystem;
pub use trajectory::Trajectory;
pub use update::{OpinionUpdateRule, StepOutcome};

/// Events in the opinion dynamics simulation
#[derive(Debug, Clone)]
pub enum Event {
    /// Execute the given 1-based step
    Step { step: usize },
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// `max_steps` steps were executed without converging
    StepBudgetExhausted,
    /// `min_stationary` consecutive steps moved no opinion beyond tolerance
    ConvergedStationary,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::StepBudgetExhausted => write!(f, "Step budget exhausted"),
            StopReason::ConvergedStationary => write!(f, "Converged (stationary)"),
        }
    }
}

/// Statistics reported by the opinion system
#[derive(Debug, Clone)]
pub struct OpinionStats {
    pub steps_completed: usize,
    /// Stationary streak at the last step
    pub stationary_steps: usize,
    /// `None` while the run is still in progress
    pub stop_reason: Option<StopReason>,
    pub num_agents: usize,
    pub edge_count: usize,
    pub isolated_agents: usize,
    pub interactions_applied: usize,
    pub interactions_rejected: usize,
    /// Committed opinions after every step
    pub trajectory: Vec<Vec<f64>>,
}

impl OpinionStats {
    pub fn is_converged(&self) -> bool {
        self.stop_reason == Some(StopReason::ConvergedStationary)
    }

    /// Share of attempted interactions that fell within the confidence bound
    pub fn acceptance_rate(&self) -> f64 {
        let attempted = self.interactions_applied + self.interactions_rejected;
        if attempted == 0 {
            return 0.0;
        }
        self.interactions_applied as f64 / attempted as f64
    }

    /// The finished trajectory, or `MissingStats` if the run never stopped
    pub fn into_trajectory(self) -> SimResult<Trajectory> {
        let reason = self.stop_reason.ok_or(SimError::MissingStats)?;
        Ok(Trajectory::new(self.trajectory, reason))
    }
}

/// Combined stats enum for DES framework compatibility
#[derive(Debug, Clone)]
pub enum Stats {
    Opinion(OpinionStats),
}

/// Drive a prepared system through the event loop until it stops
pub fn run_to_completion(system: OpinionSystem) -> SimResult<OpinionStats> {
    let max_steps = system.params().max_steps;
    let mut event_loop: EventLoop<Event, Stats> =
        EventLoop::new(vec![(1, Event::Step { step: 1 })], vec![Box::new(system)]);

    event_loop.run(max_steps);

    match event_loop.stats().into_iter().next() {
        Some(Stats::Opinion(stats)) => Ok(stats),
        None => Err(SimError::MissingStats),
    }
}

/// Run one simulation and return its full opinion trajectory
pub fn run_simulation(params: &SimulationParams) -> SimResult<Trajectory> {
    run_to_completion(OpinionSystem::new(params.clone())?)?.into_trajectory()
}

/// As [`run_simulation`], forwarding per-step hooks to `observer`
pub fn run_simulation_observed(
    params: &SimulationParams,
    observer: Box<dyn StepObserver>,
) -> SimResult<Trajectory> {
    let system = OpinionSystem::new(params.clone())?.with_observer(observer);
    run_to_completion(system)?.into_trajectory()
}
