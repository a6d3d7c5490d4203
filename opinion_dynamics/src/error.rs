use thiserror::Error;

/// A parameter set that cannot be simulated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("number of agents must be at least 1")]
    NoAgents,

    #[error("edge probability must lie in [0, 1], got {0}")]
    EdgeProbability(f64),

    #[error("confidence threshold must be finite and non-negative, got {0}")]
    ConfidenceThreshold(f64),

    #[error("adaptation rate must lie in (0, 1], got {0}")]
    AdaptationRate(f64),

    #[error("number of update nodes must lie in [1, {num_agents}], got {requested}")]
    UpdateNodes { requested: usize, num_agents: usize },

    #[error("max steps must be at least 1")]
    MaxSteps,

    #[error("min stationary steps must be at least 1")]
    MinStationary,
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("drew {drawn} edges but a simple graph on these nodes holds at most {max}")]
    EdgeCountExceeded { drawn: u64, max: u64 },

    #[error("{got} opinions supplied for a network of {expected} agents")]
    OpinionCountMismatch { expected: usize, got: usize },

    #[error("edge ({0}, {1}) is a self-loop or references a missing agent")]
    InvalidEdge(usize, usize),

    #[error("event loop finished without reporting opinion stats")]
    MissingStats,
}

pub type SimResult<T> = Result<T, SimError>;
