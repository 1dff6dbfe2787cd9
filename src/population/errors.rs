use crate::models::{CrossoverError, GenomeError, TopologyError};

/// Errors that can occur while building or evolving a population.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("GenomeError: entity {index}: {source}")]
    Genome {
        index: usize,
        #[source]
        source: GenomeError,
    },
    #[error("TopologyError: {0}")]
    Topology(#[from] TopologyError),
    #[error("TopologyMismatch: entity {index} does not match the population's layer shape")]
    TopologyMismatch { index: usize },
    #[error("CrossoverError: {0}")]
    Crossover(#[from] CrossoverError),
}
