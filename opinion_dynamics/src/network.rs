use std::collections::HashSet;

use rand::Rng;
use rand_distr::{Binomial, Distribution};
use tracing::{debug, trace};

use crate::error::{ConfigError, SimError, SimResult};

/// Undirected simple graph over agent ids `0..n`
///
/// Neighbor lists keep insertion order, so sampling a neighbor by index is
/// reproducible for a fixed seed.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    adjacency: Vec<Vec<usize>>,
    edge_count: usize,
}

impl Network {
    /// Network of `n` isolated nodes
    pub fn empty(n: usize) -> Self {
        Network {
            adjacency: vec![Vec::new(); n],
            edge_count: 0,
        }
    }

    /// Build a network from an explicit edge list.
    ///
    /// Repeated edges (in either orientation) are counted once.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> SimResult<Self> {
        let mut network = Network::empty(n);
        for &(a, b) in edges {
            if a == b || a >= n || b >= n {
                return Err(SimError::InvalidEdge(a, b));
            }
            if !network.has_edge(a, b) {
                network.link(a, b);
            }
        }
        Ok(network)
    }

    /// Number of edges in a complete graph on `n` nodes, n(n-1)/2
    pub fn max_edges(n: usize) -> u64 {
        let n = n as u64;
        n * n.saturating_sub(1) / 2
    }

    fn link(&mut self, a: usize, b: usize) {
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
        self.edge_count += 1;
    }

    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn neighbors(&self, id: usize) -> &[usize] {
        &self.adjacency[id]
    }

    pub fn degree(&self, id: usize) -> usize {
        self.adjacency[id].len()
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.adjacency[a].contains(&b)
    }

    /// Nodes with no neighbors
    pub fn isolated_count(&self) -> usize {
        self.adjacency.iter().filter(|n| n.is_empty()).count()
    }

    /// Every edge appears in both endpoints' lists and no node lists itself
    pub fn is_symmetric_and_loop_free(&self) -> bool {
        self.adjacency.iter().enumerate().all(|(a, neighbors)| {
            neighbors
                .iter()
                .all(|&b| b != a && self.adjacency[b].contains(&a))
        })
    }

    /// Hand the adjacency lists over to the agent pool
    pub fn into_adjacency(self) -> Vec<Vec<usize>> {
        self.adjacency
    }
}

/// Edge-independent random graph generator
///
/// The edge count is drawn once from Binomial(n(n-1)/2, p); that many
/// distinct node pairs are then sampled uniformly by rejection.
#[derive(Debug, Clone, Copy)]
pub struct RandomGraphBuilder {
    num_nodes: usize,
    edge_probability: f64,
}

impl RandomGraphBuilder {
    pub fn new(num_nodes: usize, edge_probability: f64) -> Self {
        RandomGraphBuilder {
            num_nodes,
            edge_probability,
        }
    }

    /// Draw the target edge count from `count_rng`, then place edges with `rng`.
    pub fn build<C, R>(&self, count_rng: &mut C, rng: &mut R) -> SimResult<Network>
    where
        C: Rng + ?Sized,
        R: Rng + ?Sized,
    {
        let n = self.num_nodes;
        let max_edges = Network::max_edges(n);
        let mut network = Network::empty(n);
        if max_edges == 0 {
            return Ok(network);
        }

        let binomial = Binomial::new(max_edges, self.edge_probability)
            .map_err(|_| ConfigError::EdgeProbability(self.edge_probability))?;
        let drawn = binomial.sample(count_rng);
        if drawn > max_edges {
            return Err(SimError::EdgeCountExceeded {
                drawn,
                max: max_edges,
            });
        }
        let num_edges = drawn as usize;
        debug!(num_edges, max_edges, "drew target edge count");

        let mut present: HashSet<(usize, usize)> = HashSet::with_capacity(num_edges);
        while network.edge_count() < num_edges {
            let a = rng.random_range(0..n);
            let b = rng.random_range(0..n);
            if a == b {
                continue;
            }
            if !present.insert((a.min(b), a.max(b))) {
                continue;
            }
            network.link(a, b);
            trace!(a, b, "added edge");
        }

        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build(n: usize, p: f64, seed: u64) -> Network {
        let mut count_rng = StdRng::seed_from_u64(seed ^ 0xABCD);
        let mut rng = StdRng::seed_from_u64(seed);
        RandomGraphBuilder::new(n, p)
            .build(&mut count_rng, &mut rng)
            .unwrap()
    }

    #[test]
    fn max_edges_formula() {
        assert_eq!(Network::max_edges(0), 0);
        assert_eq!(Network::max_edges(1), 0);
        assert_eq!(Network::max_edges(2), 1);
        assert_eq!(Network::max_edges(100), 4950);
    }

    #[test]
    fn single_node_terminates_without_edges() {
        let network = build(1, 1.0, 1);
        assert_eq!(network.num_nodes(), 1);
        assert_eq!(network.edge_count(), 0);
    }

    #[test]
    fn zero_probability_gives_no_edges() {
        let network = build(50, 0.0, 3);
        assert_eq!(network.edge_count(), 0);
        assert_eq!(network.isolated_count(), 50);
    }

    #[test]
    fn full_probability_gives_complete_graph() {
        let network = build(12, 1.0, 3);
        assert_eq!(network.edge_count() as u64, Network::max_edges(12));
        for id in 0..12 {
            assert_eq!(network.degree(id), 11);
        }
    }

    #[test]
    fn generated_graphs_are_symmetric_and_loop_free() {
        for (seed, p) in [(1, 0.05), (2, 0.3), (3, 0.7), (4, 1.0)] {
            let network = build(40, p, seed);
            assert!(network.is_symmetric_and_loop_free());
            assert!(network.edge_count() as u64 <= Network::max_edges(40));

            let listed: usize = (0..40).map(|id| network.degree(id)).sum();
            assert_eq!(listed, 2 * network.edge_count());
        }
    }

    #[test]
    fn no_duplicate_neighbors() {
        let network = build(30, 0.5, 9);
        for id in 0..30 {
            let unique: HashSet<_> = network.neighbors(id).iter().collect();
            assert_eq!(unique.len(), network.degree(id));
        }
    }

    #[test]
    fn edge_count_tracks_binomial_mean() {
        // mean 0.2 * 19900 = 3980, sd ~ 56
        let network = build(200, 0.2, 11);
        let edges = network.edge_count() as f64;
        assert!(
            (edges - 3980.0).abs() < 400.0,
            "edge count {} far from binomial mean",
            edges
        );
    }

    #[test]
    fn same_seed_same_graph() {
        assert_eq!(build(30, 0.2, 5), build(30, 0.2, 5));
    }

    #[test]
    fn from_edges_deduplicates() {
        let network = Network::from_edges(3, &[(0, 1), (1, 0), (1, 2)]).unwrap();
        assert_eq!(network.edge_count(), 2);
        assert!(network.has_edge(1, 0));
        assert!(network.has_edge(2, 1));
        assert!(!network.has_edge(0, 2));
    }

    #[test]
    fn from_edges_rejects_loops_and_missing_nodes() {
        assert!(matches!(
            Network::from_edges(3, &[(1, 1)]),
            Err(SimError::InvalidEdge(1, 1))
        ));
        assert!(matches!(
            Network::from_edges(3, &[(0, 3)]),
            Err(SimError::InvalidEdge(0, 3))
        ));
    }
}
