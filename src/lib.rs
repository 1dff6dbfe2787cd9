//! Evolves populations of small feed-forward threshold networks.
//!
//! Each entity is stored as a flat genome string (see [`models::genome`]).
//! A [`Population`] decodes a generation, lets a driver run every entity
//! against its own inputs and score it, ranks the generation with
//! [`Population::finish`] and serializes the next one with
//! [`Population::evolve`].
//!
//! ```rust
//! use fx_neuroevo::Population;
//! use fx_neuroevo::models::{EvolutionParams, PopulationParams};
//!
//! let params = PopulationParams::new(20, 1, vec![1], 1)?;
//! let mut population = Population::new(params.clone())?;
//!
//! for index in 0..population.len() {
//!     let entity = population.entity_mut(index).expect("index is in range");
//!     let output = entity.run(&[1.0])[0];
//!     entity.set_scorer(move || output);
//! }
//! population.finish(0);
//!
//! let genomes = population.evolve(&EvolutionParams::new(0.01, 20.0, 10.0, 20.0)?)?;
//! let next = Population::from_genomes(params.with_iteration(1), &genomes)?;
//! assert_eq!(next.len(), 20);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod models;
pub mod population;

pub use population::{Error, Population};
