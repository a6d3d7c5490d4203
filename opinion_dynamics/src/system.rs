use des::{Agent, Response};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::agent::AgentPool;
use crate::convergence::ConvergenceDetector;
use crate::error::{SimError, SimResult};
use crate::observer::{NoopObserver, StepObserver};
use crate::params::SimulationParams;
use crate::update::OpinionUpdateRule;
use crate::{Event, OpinionStats, Stats, StopReason};

/// Golden-ratio constant used to derive the edge-count seed from the run seed
const EDGE_COUNT_SEED_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// Drives one bounded-confidence run step by step
///
/// Each `Event::Step` executes the update rule, commits the proposed
/// opinions, checks for movement and records a snapshot. The system
/// reschedules itself one step ahead until the stationary streak reaches
/// `min_stationary` or the step budget is spent.
pub struct OpinionSystem {
    params: SimulationParams,
    pool: AgentPool,
    rule: OpinionUpdateRule,
    detector: ConvergenceDetector,
    rng: StdRng,
    observer: Box<dyn StepObserver>,
    trajectory: Vec<Vec<f64>>,
    /// Consecutive steps without material change
    stationary: usize,
    steps_completed: usize,
    interactions_applied: usize,
    interactions_rejected: usize,
    stop_reason: Option<StopReason>,
}

impl OpinionSystem {
    /// Validate the parameters and build a random population from the seed
    pub fn new(params: SimulationParams) -> SimResult<Self> {
        params.validate()?;
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut count_rng = StdRng::seed_from_u64(params.seed ^ EDGE_COUNT_SEED_MIX);
        let pool = AgentPool::initialize(
            params.num_agents,
            params.edge_probability,
            &mut count_rng,
            &mut rng,
        )?;
        Ok(Self::assemble(params, pool, rng))
    }

    /// Run the dynamics on a prepared population
    ///
    /// `edge_probability` is ignored; the pool already carries its network.
    pub fn with_pool(params: SimulationParams, pool: AgentPool) -> SimResult<Self> {
        params.validate()?;
        if pool.len() != params.num_agents {
            return Err(SimError::OpinionCountMismatch {
                expected: params.num_agents,
                got: pool.len(),
            });
        }
        let rng = StdRng::seed_from_u64(params.seed);
        Ok(Self::assemble(params, pool, rng))
    }

    fn assemble(params: SimulationParams, pool: AgentPool, rng: StdRng) -> Self {
        info!(
            agents = pool.len(),
            edges = pool.edge_count(),
            confidence = params.confidence_threshold,
            alpha = params.adaptation_rate,
            update_nodes = params.num_update_nodes,
            seed = params.seed,
            "starting opinion dynamics"
        );
        OpinionSystem {
            rule: OpinionUpdateRule::from_params(&params),
            detector: ConvergenceDetector::default(),
            params,
            pool,
            rng,
            observer: Box::new(NoopObserver),
            trajectory: Vec::new(),
            stationary: 0,
            steps_completed: 0,
            interactions_applied: 0,
            interactions_rejected: 0,
            stop_reason: None,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn StepObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Execute one step and return the stop reason once the run is over.
    ///
    /// Calling again after the run has stopped does nothing.
    pub fn step(&mut self) -> Option<StopReason> {
        if self.stop_reason.is_some() {
            return self.stop_reason;
        }
        let step = self.steps_completed + 1;

        let outcome = self.rule.step(&mut self.pool, &mut self.rng);
        self.pool.commit();
        let changed = self.detector.changed(&self.pool);
        if changed {
            self.stationary = 0;
        } else {
            self.stationary += 1;
        }
        self.trajectory.push(self.pool.opinions());
        self.steps_completed = step;
        self.interactions_applied += outcome.applied;
        self.interactions_rejected += outcome.rejected;

        debug!(
            step,
            stationary = self.stationary,
            changed,
            applied = outcome.applied,
            max_delta = self.detector.max_delta(&self.pool),
            "step committed"
        );
        self.observer.on_step_end(step, self.stationary, changed);

        self.stop_reason = if self.stationary >= self.params.min_stationary {
            Some(StopReason::ConvergedStationary)
        } else if step >= self.params.max_steps {
            Some(StopReason::StepBudgetExhausted)
        } else {
            None
        };
        if let Some(reason) = self.stop_reason {
            info!(steps = step, %reason, "opinion dynamics stopped");
            self.observer.on_run_end(step, reason);
        }
        self.stop_reason
    }

    /// Step until the run stops, bypassing the event loop
    pub fn run_to_end(&mut self) -> StopReason {
        loop {
            if let Some(reason) = self.step() {
                return reason;
            }
        }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn pool(&self) -> &AgentPool {
        &self.pool
    }

    pub fn trajectory(&self) -> &[Vec<f64>] {
        &self.trajectory
    }

    pub fn stationary_steps(&self) -> usize {
        self.stationary
    }

    pub fn steps_completed(&self) -> usize {
        self.steps_completed
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }
}

impl Agent<Event, Stats> for OpinionSystem {
    fn act(&mut self, _current_t: usize, data: &Event) -> Response<Event> {
        match data {
            Event::Step { step } => match self.step() {
                Some(_) => Response::new(),
                None => Response::event(step + 1, Event::Step { step: step + 1 }),
            },
        }
    }

    fn stats(&self) -> Stats {
        Stats::Opinion(OpinionStats {
            steps_completed: self.steps_completed,
            stationary_steps: self.stationary,
            stop_reason: self.stop_reason,
            num_agents: self.pool.len(),
            edge_count: self.pool.edge_count(),
            isolated_agents: self.pool.isolated_count(),
            interactions_applied: self.interactions_applied,
            interactions_rejected: self.interactions_rejected,
            trajectory: self.trajectory.clone(),
        })
    }
}
