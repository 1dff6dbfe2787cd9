//! # Parity Example
//!
//! Evolves a population of one-input, one-output networks that tell even
//! numbers from odd ones. Each tick a random integer is encoded as 0.5 (even)
//! or 1.0 (odd); an output above 0.5 is read as "even". The fitness of an
//! entity is the number of correct answers over 50 draws.
//!
//! Run with `cargo run --example parity`.

use anyhow::Result;
use fx_neuroevo::Population;
use fx_neuroevo::models::{EvolutionParams, PopulationParams};
use rand::Rng;

const ENTITY_COUNT: usize = 1000;
const GENERATIONS: u32 = 100;
const DRAWS: usize = 50;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let params = PopulationParams::new(ENTITY_COUNT, 1, vec![1], 1)?;
    let evolution = EvolutionParams::new(0.0003, 20.0, 10.0, 20.0)?;
    let mut population = Population::new(params.clone())?;
    let mut rng = rand::rng();
    let mut max_score = 0.0_f64;

    for generation in 0..GENERATIONS {
        let mut results = vec![0.0; population.len()];

        // one simulated tick per draw, every entity answers before the next draw
        for _ in 0..DRAWS {
            let n: u32 = rng.random_range(0..1000);
            let input = (n % 2) as f64 / 2.0 + 0.5;

            for (index, result) in results.iter_mut().enumerate() {
                let Some(entity) = population.entity_mut(index) else {
                    continue;
                };
                let says_even = entity.run(&[input])[0] > 0.5;
                if says_even == (n % 2 == 0) {
                    *result += 1.0;
                }
            }
        }

        for (entity, &score) in population.entities_mut().iter_mut().zip(&results) {
            entity.set_scorer(move || score);
            max_score = max_score.max(score);
        }

        population.finish(generation);
        population = population.next_generation(&evolution)?;
    }

    let champion = population
        .entity(0)
        .map(|entity| entity.to_genome())
        .unwrap_or_default();
    println!("max score: {max_score}/{DRAWS}");
    println!("champion: {champion}");

    Ok(())
}
