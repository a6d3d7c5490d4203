use rand::Rng;
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::network::{Network, RandomGraphBuilder};

/// A single member of the population
#[derive(Debug, Clone, PartialEq)]
pub struct OpinionAgent {
    id: usize,
    current_opinion: f64,
    previous_opinion: f64,
    proposed_opinion: f64,
    neighbors: Vec<usize>,
}

impl OpinionAgent {
    fn new(id: usize, opinion: f64, neighbors: Vec<usize>) -> Self {
        OpinionAgent {
            id,
            current_opinion: opinion,
            previous_opinion: opinion,
            proposed_opinion: opinion,
            neighbors,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Opinion used for comparisons during the current step
    pub fn current_opinion(&self) -> f64 {
        self.current_opinion
    }

    /// Opinion at the start of the last committed step
    pub fn previous_opinion(&self) -> f64 {
        self.previous_opinion
    }

    /// Opinion accumulated so far in the step being computed
    pub fn proposed_opinion(&self) -> f64 {
        self.proposed_opinion
    }

    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors
    }

    pub fn is_isolated(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Movement over the last committed step
    pub fn last_delta(&self) -> f64 {
        (self.current_opinion - self.previous_opinion).abs()
    }

    pub(crate) fn shift_proposed(&mut self, amount: f64) {
        self.proposed_opinion += amount;
    }

    fn commit(&mut self) {
        self.previous_opinion = self.current_opinion;
        self.current_opinion = self.proposed_opinion;
    }
}

/// The population plus its fixed social network
#[derive(Debug, Clone, PartialEq)]
pub struct AgentPool {
    agents: Vec<OpinionAgent>,
    edge_count: usize,
}

impl AgentPool {
    /// Draw `n` opinions uniformly from [0, 1), then wire them with a random
    /// graph of edge probability `p`.
    ///
    /// Opinions and edge placement use `rng`; the edge count uses the
    /// independent `count_rng`.
    pub fn initialize<C, R>(n: usize, p: f64, count_rng: &mut C, rng: &mut R) -> SimResult<Self>
    where
        C: Rng + ?Sized,
        R: Rng + ?Sized,
    {
        let opinions: Vec<f64> = (0..n).map(|_| rng.random::<f64>()).collect();
        let network = RandomGraphBuilder::new(n, p).build(count_rng, rng)?;
        debug!(
            agents = n,
            edges = network.edge_count(),
            isolated = network.isolated_count(),
            "initialized agent pool"
        );
        Self::with_opinions(opinions, network)
    }

    /// Pool with explicit starting opinions on a given network
    pub fn with_opinions(opinions: Vec<f64>, network: Network) -> SimResult<Self> {
        if opinions.len() != network.num_nodes() {
            return Err(SimError::OpinionCountMismatch {
                expected: network.num_nodes(),
                got: opinions.len(),
            });
        }
        let edge_count = network.edge_count();
        let agents = opinions
            .into_iter()
            .zip(network.into_adjacency())
            .enumerate()
            .map(|(id, (opinion, neighbors))| OpinionAgent::new(id, opinion, neighbors))
            .collect();
        Ok(AgentPool { agents, edge_count })
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[OpinionAgent] {
        &self.agents
    }

    pub fn agent(&self, id: usize) -> &OpinionAgent {
        &self.agents[id]
    }

    pub(crate) fn agent_mut(&mut self, id: usize) -> &mut OpinionAgent {
        &mut self.agents[id]
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn isolated_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_isolated()).count()
    }

    /// Current opinions indexed by agent id
    pub fn opinions(&self) -> Vec<f64> {
        self.agents.iter().map(|a| a.current_opinion).collect()
    }

    /// Make every proposed opinion current.
    ///
    /// Afterwards `proposed == current` for every agent, ready for the next step.
    pub fn commit(&mut self) {
        for agent in &mut self.agents {
            agent.commit();
        }
    }
}
