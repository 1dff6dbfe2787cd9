mod crossover;
mod entity;
pub mod genome;
mod identity;
mod mutagen;
mod network;
mod params;

pub use crossover::CrossoverError;
pub use entity::Entity;
pub use genome::{ENTITY_SEPARATOR, GenomeError};
pub use identity::Identity;
pub use mutagen::{MutationRate, MutationRateOutOfRange};
pub use network::{Link, LinkIndex, Network, Node, NodeIndex, NodeKind, Topology, TopologyError};
pub use params::{EvolutionParams, ParamsError, PercentageError, PopulationParams, SlotBudget};

pub(crate) use crossover::breed;
