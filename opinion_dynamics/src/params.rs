use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Parameters for a single bounded-confidence run
///
/// Missing fields in a TOML file fall back to [`SimulationParams::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Number of agents (network size)
    pub num_agents: usize,
    /// Independent probability of each possible edge
    pub edge_probability: f64,
    /// Agents whose opinions differ by this much or more never interact
    pub confidence_threshold: f64,
    /// Fraction of the opinion gap transferred per interaction
    pub adaptation_rate: f64,
    /// Distinct agents picked for an update attempt each step
    pub num_update_nodes: usize,
    /// Hard ceiling on the number of steps
    pub max_steps: usize,
    /// Consecutive unchanged steps required to declare convergence
    pub min_stationary: usize,
    /// Seed for every random draw in the run
    pub seed: u64,
}

impl SimulationParams {
    /// Reject parameter combinations that cannot be simulated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_agents < 1 {
            return Err(ConfigError::NoAgents);
        }
        if !(0.0..=1.0).contains(&self.edge_probability) {
            return Err(ConfigError::EdgeProbability(self.edge_probability));
        }
        if !self.confidence_threshold.is_finite() || self.confidence_threshold < 0.0 {
            return Err(ConfigError::ConfidenceThreshold(self.confidence_threshold));
        }
        if !(self.adaptation_rate > 0.0 && self.adaptation_rate <= 1.0) {
            return Err(ConfigError::AdaptationRate(self.adaptation_rate));
        }
        if self.num_update_nodes < 1 || self.num_update_nodes > self.num_agents {
            return Err(ConfigError::UpdateNodes {
                requested: self.num_update_nodes,
                num_agents: self.num_agents,
            });
        }
        if self.max_steps < 1 {
            return Err(ConfigError::MaxSteps);
        }
        if self.min_stationary < 1 {
            return Err(ConfigError::MinStationary);
        }
        Ok(())
    }

    /// Expected number of edges, p × n(n-1)/2
    pub fn expected_edges(&self) -> f64 {
        let n = self.num_agents as f64;
        self.edge_probability * n * (n - 1.0) / 2.0
    }

    /// Mean degree of the generated network, p × (n-1)
    pub fn expected_degree(&self) -> f64 {
        self.edge_probability * self.num_agents.saturating_sub(1) as f64
    }

    /// Default settings: sparse network, moderate confidence
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Wide confidence bound; a connected network ends in one opinion cluster
    pub fn consensus() -> Self {
        SimulationParams {
            confidence_threshold: 0.6,
            edge_probability: 0.1,
            ..Self::default()
        }
    }

    /// Narrow confidence bound; opinions freeze into several clusters
    pub fn fragmented() -> Self {
        SimulationParams {
            confidence_threshold: 0.1,
            edge_probability: 0.1,
            ..Self::default()
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "baseline" => Some(Self::baseline()),
            "consensus" => Some(Self::consensus()),
            "fragmented" => Some(Self::fragmented()),
            _ => None,
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ParamsFileError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&contents)?)
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            num_agents: 100,
            edge_probability: 0.05,
            confidence_threshold: 0.3,
            adaptation_rate: 0.1,
            num_update_nodes: 1,
            max_steps: 6000,
            min_stationary: 100,
            seed: 42,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParamsFileError {
    #[error("failed to read parameter file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse parameter file: {0}")]
    Parse(#[from] toml::de::Error),
}
