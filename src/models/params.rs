use super::mutagen::{MutationRate, MutationRateOutOfRange};
use super::network::{Topology, TopologyError};
use serde::{Deserialize, Serialize};

/// Shape and size of a population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationParams {
    pub entity_count: usize,
    pub input_count: usize,
    pub output_count: usize,
    pub hidden_layer_sizes: Vec<usize>,
    /// Generation counter used for logging only.
    #[serde(default)]
    pub iteration: u32,
}

impl PopulationParams {
    pub fn new(
        entity_count: usize,
        input_count: usize,
        hidden_layer_sizes: Vec<usize>,
        output_count: usize,
    ) -> Result<Self, TopologyError> {
        let params = Self {
            entity_count,
            input_count,
            output_count,
            hidden_layer_sizes,
            iteration: 0,
        };
        params.validate()?;

        Ok(params)
    }

    pub fn with_iteration(mut self, iteration: u32) -> Self {
        self.iteration = iteration;
        self
    }

    pub fn validate(&self) -> Result<(), TopologyError> {
        self.topology().validate()
    }

    pub fn topology(&self) -> Topology {
        Topology {
            inputs: self.input_count,
            hidden: self.hidden_layer_sizes.clone(),
            outputs: self.output_count,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PercentageError {
    #[error("{name} must be between 0 and 100, got {value}")]
    OutOfRange { name: &'static str, value: f64 },
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    #[error("Percentage error: {0}")]
    Percentage(#[from] PercentageError),
    #[error("Mutation rate error: {0}")]
    MutationRate(#[from] MutationRateOutOfRange),
}

fn percentage(name: &'static str, value: f64) -> Result<f64, PercentageError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(PercentageError::OutOfRange { name, value });
    }

    Ok(value)
}

#[derive(Debug, Deserialize)]
struct RawEvolutionParams {
    mutation_rate: f64,
    new_creature_percent: f64,
    #[serde(default)]
    keep_top_percent: f64,
    top_parents_percent: f64,
}

/// Knobs of [`crate::Population::evolve`].
///
/// `mutation_rate` is a per-gene probability in [0.0, 1.0]; the other three
/// are percentages of the population size in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEvolutionParams")]
pub struct EvolutionParams {
    mutation_rate: MutationRate,
    new_creature_percent: f64,
    keep_top_percent: f64,
    top_parents_percent: f64,
}

/// Slot counts derived once from [`EvolutionParams`] for a population of a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotBudget {
    /// Elites copied verbatim, `floor(keep_top% * N)`.
    pub keep_top: usize,
    /// Slots reserved for reseeding, `floor(new_creature% * N)`.
    pub new_creatures: usize,
    /// Size of the parent pool, `ceil(top_parents% * N)`.
    pub parents: usize,
}

impl EvolutionParams {
    pub fn new(
        mutation_rate: f64,
        new_creature_percent: f64,
        keep_top_percent: f64,
        top_parents_percent: f64,
    ) -> Result<Self, ParamsError> {
        Ok(Self {
            mutation_rate: MutationRate::new(mutation_rate)?,
            new_creature_percent: percentage("new_creature_percent", new_creature_percent)?,
            keep_top_percent: percentage("keep_top_percent", keep_top_percent)?,
            top_parents_percent: percentage("top_parents_percent", top_parents_percent)?,
        })
    }

    pub fn mutation_rate(&self) -> MutationRate {
        self.mutation_rate
    }

    pub fn new_creature_percent(&self) -> f64 {
        self.new_creature_percent
    }

    pub fn keep_top_percent(&self) -> f64 {
        self.keep_top_percent
    }

    pub fn top_parents_percent(&self) -> f64 {
        self.top_parents_percent
    }

    pub fn budget(&self, population_size: usize) -> SlotBudget {
        let size = population_size as f64;
        let share = |percent: f64| percent / 100.0 * size;

        SlotBudget {
            keep_top: (share(self.keep_top_percent).floor() as usize).min(population_size),
            new_creatures: (share(self.new_creature_percent).floor() as usize)
                .min(population_size),
            parents: (share(self.top_parents_percent).ceil() as usize).min(population_size),
        }
    }
}

impl TryFrom<RawEvolutionParams> for EvolutionParams {
    type Error = ParamsError;

    fn try_from(raw: RawEvolutionParams) -> Result<Self, Self::Error> {
        Self::new(
            raw.mutation_rate,
            raw.new_creature_percent,
            raw.keep_top_percent,
            raw.top_parents_percent,
        )
    }
}
