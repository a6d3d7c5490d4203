use crate::agent::AgentPool;

/// Movement below this is treated as no change
pub const OPINION_EPSILON: f64 = 1e-8;

/// Decides whether the last committed step moved any opinion materially
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceDetector {
    epsilon: f64,
}

impl ConvergenceDetector {
    pub fn new(epsilon: f64) -> Self {
        ConvergenceDetector { epsilon }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// True iff some agent moved by more than epsilon over the last step.
    ///
    /// Must run after [`AgentPool::commit`]; it compares each agent's
    /// previous opinion against its new current one.
    pub fn changed(&self, pool: &AgentPool) -> bool {
        pool.agents().iter().any(|a| a.last_delta() > self.epsilon)
    }

    /// Largest single-agent movement over the last step
    pub fn max_delta(&self, pool: &AgentPool) -> f64 {
        pool.agents()
            .iter()
            .map(|a| a.last_delta())
            .fold(0.0, f64::max)
    }
}

impl Default for ConvergenceDetector {
    fn default() -> Self {
        ConvergenceDetector::new(OPINION_EPSILON)
    }
}
