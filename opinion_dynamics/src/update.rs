use rand::seq::{index, IndexedRandom};
use rand::Rng;
use tracing::trace;

use crate::agent::AgentPool;
use crate::params::SimulationParams;

/// What happened during one application of the update rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Agents sampled for an update attempt
    pub picked: usize,
    /// Sampled agents skipped for having no neighbors
    pub isolated: usize,
    /// Pairs close enough to move toward each other
    pub applied: usize,
    /// Pairs too far apart to interact
    pub rejected: usize,
}

/// Bounded-confidence pairwise averaging (Deffuant-style)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpinionUpdateRule {
    confidence_threshold: f64,
    adaptation_rate: f64,
    num_update_nodes: usize,
}

impl OpinionUpdateRule {
    pub fn new(confidence_threshold: f64, adaptation_rate: f64, num_update_nodes: usize) -> Self {
        OpinionUpdateRule {
            confidence_threshold,
            adaptation_rate,
            num_update_nodes,
        }
    }

    pub fn from_params(params: &SimulationParams) -> Self {
        Self::new(
            params.confidence_threshold,
            params.adaptation_rate,
            params.num_update_nodes,
        )
    }

    /// Sample distinct agents and let each interact with one random neighbor.
    ///
    /// Changes accumulate in the proposed opinions only; nothing is visible in
    /// the current opinions until the pool is committed. The sample size is
    /// capped at the population size.
    pub fn step<R: Rng + ?Sized>(&self, pool: &mut AgentPool, rng: &mut R) -> StepOutcome {
        let amount = self.num_update_nodes.min(pool.len());
        let picked = index::sample(rng, pool.len(), amount);

        let mut outcome = StepOutcome {
            picked: picked.len(),
            ..StepOutcome::default()
        };
        for i in picked.iter() {
            let Some(&j) = pool.agent(i).neighbors().choose(rng) else {
                outcome.isolated += 1;
                continue;
            };
            if self.interact(pool, i, j) {
                outcome.applied += 1;
            } else {
                outcome.rejected += 1;
            }
        }
        outcome
    }

    /// Apply the pairwise rule to `i` and its neighbor `j`.
    ///
    /// With `diff = current[i] - current[j]` and `|diff| < c`, `j` gains
    /// `a * diff` and `i` loses it. Returns whether the pair interacted.
    pub fn interact(&self, pool: &mut AgentPool, i: usize, j: usize) -> bool {
        let diff = pool.agent(i).current_opinion() - pool.agent(j).current_opinion();
        trace!(i, j, diff, "evaluating pair");
        if diff.abs() >= self.confidence_threshold {
            return false;
        }

        let shift = self.adaptation_rate * diff;
        pool.agent_mut(j).shift_proposed(shift);
        pool.agent_mut(i).shift_proposed(-shift);
        true
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    pub fn adaptation_rate(&self) -> f64 {
        self.adaptation_rate
    }

    pub fn num_update_nodes(&self) -> usize {
        self.num_update_nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pair(a: f64, b: f64) -> AgentPool {
        AgentPool::with_opinions(vec![a, b], Network::from_edges(2, &[(0, 1)]).unwrap()).unwrap()
    }

    #[test]
    fn distant_pair_does_not_interact() {
        let rule = OpinionUpdateRule::new(0.3, 0.25, 1);
        let mut pool = pair(0.1, 0.5);

        assert!(!rule.interact(&mut pool, 0, 1));
        assert_eq!(pool.agent(0).proposed_opinion(), 0.1);
        assert_eq!(pool.agent(1).proposed_opinion(), 0.5);
    }

    #[test]
    fn gap_equal_to_threshold_does_not_interact() {
        let rule = OpinionUpdateRule::new(0.5, 0.25, 1);
        let mut pool = pair(0.25, 0.75);
        assert!(!rule.interact(&mut pool, 0, 1));
    }

    #[test]
    fn close_pair_moves_by_rate_scaled_gap() {
        let rule = OpinionUpdateRule::new(0.5, 0.25, 1);
        let mut pool = pair(0.3, 0.6);

        assert!(rule.interact(&mut pool, 0, 1));

        let diff = 0.3 - 0.6;
        assert_abs_diff_eq!(pool.agent(1).proposed_opinion(), 0.6 + 0.25 * diff, epsilon = 1e-15);
        assert_abs_diff_eq!(pool.agent(0).proposed_opinion(), 0.3 - 0.25 * diff, epsilon = 1e-15);

        // new gap is (1 - 2a) times the old one
        let new_gap = pool.agent(0).proposed_opinion() - pool.agent(1).proposed_opinion();
        assert_abs_diff_eq!(new_gap, (1.0 - 2.0 * 0.25) * diff, epsilon = 1e-15);
    }

    #[test]
    fn interaction_is_symmetric_in_direction() {
        let rule = OpinionUpdateRule::new(1.0, 0.1, 1);
        let mut forward = pair(0.2, 0.4);
        let mut backward = pair(0.2, 0.4);

        rule.interact(&mut forward, 0, 1);
        rule.interact(&mut backward, 1, 0);

        assert_abs_diff_eq!(
            forward.agent(0).proposed_opinion(),
            backward.agent(0).proposed_opinion(),
            epsilon = 1e-15
        );
        assert_abs_diff_eq!(
            forward.agent(1).proposed_opinion(),
            backward.agent(1).proposed_opinion(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn interaction_reads_current_not_proposed() {
        let rule = OpinionUpdateRule::new(1.0, 0.5, 1);
        let mut pool = pair(0.0, 0.5);

        rule.interact(&mut pool, 0, 1);
        rule.interact(&mut pool, 0, 1);

        // both interactions used the same current gap of -0.5
        assert_abs_diff_eq!(pool.agent(0).proposed_opinion(), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(pool.agent(1).proposed_opinion(), 0.0, epsilon = 1e-15);
        assert_eq!(pool.agent(0).current_opinion(), 0.0);
    }

    #[test]
    fn isolated_agents_are_skipped() {
        let rule = OpinionUpdateRule::new(1.0, 0.5, 5);
        let mut pool = AgentPool::with_opinions(vec![0.1, 0.3, 0.5, 0.7, 0.9], Network::empty(5)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = rule.step(&mut pool, &mut rng);

        assert_eq!(outcome.picked, 5);
        assert_eq!(outcome.isolated, 5);
        assert_eq!(outcome.applied + outcome.rejected, 0);
        for agent in pool.agents() {
            assert_eq!(agent.proposed_opinion(), agent.current_opinion());
        }
    }

    #[test]
    fn zero_confidence_never_interacts() {
        let rule = OpinionUpdateRule::new(0.0, 0.5, 4);
        let network = Network::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        // identical opinions still fail the strict test |diff| < 0
        let mut pool = AgentPool::with_opinions(vec![0.5; 4], network).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let outcome = rule.step(&mut pool, &mut rng);
        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.rejected, 4);
    }

    #[test]
    fn step_conserves_total_opinion() {
        let rule = OpinionUpdateRule::new(1.0, 0.3, 6);
        let edges = [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (0, 3)];
        let network = Network::from_edges(6, &edges).unwrap();
        let opinions = vec![0.05, 0.2, 0.45, 0.5, 0.8, 0.95];
        let before: f64 = opinions.iter().sum();
        let mut pool = AgentPool::with_opinions(opinions, network).unwrap();
        let mut rng = StdRng::seed_from_u64(8);

        let outcome = rule.step(&mut pool, &mut rng);
        pool.commit();

        assert_eq!(outcome.picked, 6);
        assert_eq!(outcome.applied, 6);
        let after: f64 = pool.opinions().iter().sum();
        assert_abs_diff_eq!(before, after, epsilon = 1e-12);
    }

    #[test]
    fn sample_size_is_capped_at_population() {
        let rule = OpinionUpdateRule::new(1.0, 0.3, 10);
        let mut pool = pair(0.4, 0.6);
        let mut rng = StdRng::seed_from_u64(2);

        assert_eq!(rule.step(&mut pool, &mut rng).picked, 2);
    }
}
