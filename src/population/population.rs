use super::Error;
use crate::models::{self, ENTITY_SEPARATOR, Entity, EvolutionParams, PopulationParams, genome};
use rand::Rng;
use std::cmp::Ordering;
use std::fmt;
use tracing::instrument;

/// Id and slot bookkeeping threaded through the three phases of
/// [`Population::evolve`]: ids are handed out in emission order.
struct Slots {
    next_id: u32,
    remaining: usize,
}

impl Slots {
    fn new(total: usize) -> Self {
        Self {
            next_id: 0,
            remaining: total,
        }
    }

    fn claim(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.remaining -= 1;
        id
    }
}

/// Descending fitness, NaN last.
fn by_fitness_descending(a: &Entity, b: &Entity) -> Ordering {
    let (a, b) = (a.fitness(), b.fitness());
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// All entities of one generation.
///
/// Until [`Population::finish`] runs, an entity's position is its slot index
/// as handed out at construction; afterwards positions follow rank.
#[derive(Debug)]
pub struct Population {
    params: PopulationParams,
    entities: Vec<Entity>,
    best: f64,
}

impl Population {
    /// Generates `params.entity_count` random founders.
    pub fn new(params: PopulationParams) -> Result<Self, Error> {
        Self::new_with_rng(params, &mut rand::rng())
    }

    #[instrument(level = "debug", skip(params, rng), fields(entity_count = params.entity_count, topology = ?params.topology()))]
    pub fn new_with_rng<R: Rng>(params: PopulationParams, rng: &mut R) -> Result<Self, Error> {
        params.validate()?;

        let topology = params.topology();
        let mut entities = Vec::with_capacity(params.entity_count);
        for id in 0..params.entity_count {
            entities.push(Entity::random(rng, id as u32, &topology));
        }

        Ok(Self {
            params,
            entities,
            best: 0.0,
        })
    }

    /// Rebuilds a generation from its serialized form.
    ///
    /// The population holds one entity per genome, whatever
    /// `params.entity_count` says. A single malformed genome, or one whose
    /// layer shape differs from `params`, fails the whole load.
    #[instrument(level = "debug", skip(params, genomes), fields(genomes_length = genomes.len(), iteration = params.iteration))]
    pub fn from_genomes(params: PopulationParams, genomes: &str) -> Result<Self, Error> {
        params.validate()?;

        let topology = params.topology();
        let mut entities = Vec::with_capacity(params.entity_count);

        if !genomes.is_empty() {
            for (index, text) in genome::split_population(genomes).enumerate() {
                let entity = Entity::from_genome(text).map_err(|source| {
                    tracing::error!(index, genome = text, error = %source, "Failed to decode genome");
                    Error::Genome { index, source }
                })?;

                if entity.network().topology() != topology {
                    tracing::error!(index, genome = text, "Genome does not match the population topology");
                    return Err(Error::TopologyMismatch { index });
                }

                entities.push(entity);
            }
        }

        if entities.len() != params.entity_count {
            tracing::debug!(
                "Loaded {} entities, parameters asked for {}",
                entities.len(),
                params.entity_count
            );
        }

        Ok(Self {
            params,
            entities,
            best: 0.0,
        })
    }

    pub fn params(&self) -> &PopulationParams {
        &self.params
    }

    pub fn iteration(&self) -> u32 {
        self.params.iteration
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    pub fn entity_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.entities.get_mut(index)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    /// Top fitness recorded by the last [`Population::finish`].
    pub fn best(&self) -> f64 {
        self.best
    }

    /// Scores every entity and ranks them by descending fitness.
    ///
    /// The sort is stable: entities with equal fitness keep their relative order.
    #[instrument(level = "info", skip(self), fields(entity_count = self.entities.len()))]
    pub fn finish(&mut self, iteration: u32) {
        for entity in &mut self.entities {
            entity.finish();
        }

        self.entities.sort_by(by_fitness_descending);
        self.best = self.entities.first().map_or(0.0, Entity::fitness);
        self.params.iteration = iteration;

        tracing::info!(iteration, best = self.best, "Generation finished");
    }

    /// Serializes the next generation, the same size as this one.
    pub fn evolve(&self, params: &EvolutionParams) -> Result<String, Error> {
        self.evolve_with_rng(params, &mut rand::rng())
    }

    /// Elitism, then crossover, then reseeding, with slot counts fixed up front.
    #[instrument(level = "info", skip(self, params, rng), fields(entity_count = self.entities.len(), iteration = self.params.iteration))]
    pub fn evolve_with_rng<R: Rng>(
        &self,
        params: &EvolutionParams,
        rng: &mut R,
    ) -> Result<String, Error> {
        let total = self.entities.len();
        let budget = params.budget(total);
        let mutation_rate = params.mutation_rate();
        let mut slots = Slots::new(total);
        let mut genomes = Vec::with_capacity(total);

        for elite in self.entities.iter().take(budget.keep_top) {
            genomes.push(elite.to_genome_as(slots.claim()));
        }
        let elites = genomes.len();

        let parents = &self.entities[..budget.parents];
        if parents.is_empty() && slots.remaining > budget.new_creatures {
            tracing::warn!(
                "No parents to breed from, reseeding {} crossover slots",
                slots.remaining - budget.new_creatures
            );
        }

        while !parents.is_empty() && slots.remaining > budget.new_creatures {
            let mother = &parents[rng.random_range(0..parents.len())];
            let father = &parents[rng.random_range(0..parents.len())];
            let child = models::breed(rng, slots.claim(), mother, father, &mutation_rate)?;
            genomes.push(child.to_genome());
        }
        let children = genomes.len() - elites;

        let topology = self.params.topology();
        while slots.remaining > 0 {
            genomes.push(genome::generate(rng, slots.claim(), &topology));
        }

        tracing::info!(
            elites,
            children,
            reseeded = total - elites - children,
            "Next generation bred"
        );

        Ok(genomes.join(ENTITY_SEPARATOR))
    }

    /// Evolves and loads the result as the following iteration.
    pub fn next_generation(&self, params: &EvolutionParams) -> Result<Population, Error> {
        let genomes = self.evolve(params)?;
        let next = self
            .params
            .clone()
            .with_iteration(self.params.iteration + 1);

        Self::from_genomes(next, &genomes)
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let genomes: Vec<String> = self.entities.iter().map(Entity::to_genome).collect();
        f.write_str(&genomes.join(ENTITY_SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GenomeError, NodeKind};
    use rand::{SeedableRng, rngs::StdRng};

    fn params(entity_count: usize) -> PopulationParams {
        PopulationParams::new(entity_count, 2, vec![3], 1).unwrap()
    }

    fn population(entity_count: usize, seed: u64) -> Population {
        let mut rng = StdRng::seed_from_u64(seed);
        Population::new_with_rng(params(entity_count), &mut rng).unwrap()
    }

    fn scored(scores: &[f64]) -> Population {
        let mut population = population(scores.len(), 1);
        for (entity, &score) in population.entities_mut().iter_mut().zip(scores) {
            entity.set_scorer(move || score);
        }
        population
    }

    fn load(genomes: &str) -> Population {
        Population::from_genomes(params(0), genomes).unwrap()
    }

    fn assert_layered(population: &Population) {
        for entity in population.entities() {
            let network = entity.network();
            for node in network.nodes() {
                if node.kind() == NodeKind::Input {
                    assert!(node.incoming().is_empty());
                }
                for &link in node.incoming() {
                    let source = network.node(network.link(link).source());
                    assert_eq!(source.layer() + 1, node.layer());
                    assert!(source.id() < node.id());
                }
            }
        }
    }

    #[test]
    fn it_generates_founders_in_slot_order() {
        let population = population(5, 3);

        assert_eq!(population.len(), 5);
        for (index, entity) in population.entities().iter().enumerate() {
            assert_eq!(entity.identity().id, index as u32);
            assert!(entity.identity().is_founder());
        }
        assert_layered(&population);
    }

    #[test]
    fn it_rejects_invalid_shapes() {
        let mut params = params(3);
        params.hidden_layer_sizes = vec![0];

        assert!(matches!(
            Population::new(params),
            Err(Error::Topology(_))
        ));
    }

    #[test]
    fn it_round_trips_through_its_display() {
        let population = population(4, 8);

        let reloaded = load(&population.to_string());

        assert_eq!(reloaded.to_string(), population.to_string());
        assert_eq!(reloaded.len(), 4);
    }

    #[test]
    fn it_loads_an_empty_population() {
        let population = load("");

        assert!(population.is_empty());
        assert_eq!(population.to_string(), "");
    }

    #[test]
    fn it_fails_the_whole_load_on_one_bad_genome() {
        let good = population(1, 2).to_string();
        let genomes = format!("{good}#{good}#0-0-0--|0&1@2;0.5;7,0.1-8,0.3@3;0.4;2,0.5");

        let result = Population::from_genomes(params(3), &genomes);

        assert!(matches!(
            result,
            Err(Error::Genome {
                index: 2,
                source: GenomeError::UnresolvedSource { source_id: 7, .. }
            })
        ));
    }

    #[test]
    fn it_rejects_genomes_of_another_shape() {
        let result = Population::from_genomes(params(1), "0-0-0--|0@1;0.5;0,0.3@2;0.2;1,0.7");

        assert!(matches!(result, Err(Error::TopologyMismatch { index: 0 })));
    }

    #[test]
    fn it_refuses_to_load_skip_layer_links() {
        let params = PopulationParams::new(1, 1, vec![1], 1).unwrap();

        let result = Population::from_genomes(params, "0-0-0--|0@1;0.5;0,0.3@2;0.2;0,0.7");

        assert!(matches!(
            result,
            Err(Error::Genome {
                index: 0,
                source: GenomeError::LinkOrder {
                    source_id: 0,
                    destination_id: 2
                }
            })
        ));
    }

    #[test]
    fn it_ranks_by_descending_fitness() {
        let mut population = scored(&[3.0, 1.0, 5.0, 1.0, 4.0]);

        population.finish(0);

        let fitness: Vec<f64> = population.entities().iter().map(Entity::fitness).collect();
        assert_eq!(fitness, vec![5.0, 4.0, 3.0, 1.0, 1.0]);
        assert_eq!(population.best(), 5.0);
        // ties keep slot order
        let ids: Vec<u32> = population.entities().iter().map(|e| e.identity().id).collect();
        assert_eq!(ids, vec![2, 4, 0, 1, 3]);
    }

    #[test]
    fn it_ranks_nan_fitness_last() {
        let mut population = scored(&[f64::NAN, 2.0, -1.0]);

        population.finish(4);

        assert_eq!(population.best(), 2.0);
        assert_eq!(population.entities()[1].fitness(), -1.0);
        assert!(population.entities()[2].fitness().is_nan());
        assert_eq!(population.iteration(), 4);
    }

    #[test]
    fn it_scores_zero_without_scorers() {
        let mut population = population(3, 5);

        population.finish(0);

        assert_eq!(population.best(), 0.0);
    }

    #[test]
    fn it_conserves_slots_for_any_percentages() {
        let mut population = scored(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        population.finish(0);
        let mut rng = StdRng::seed_from_u64(11);
        let percentages = [0.0, 10.0, 33.0, 50.0, 99.0, 100.0];

        for &keep in &percentages {
            for &new in &percentages {
                for &parents in &percentages {
                    let params = EvolutionParams::new(0.05, new, keep, parents).unwrap();

                    let next = load(&population.evolve_with_rng(&params, &mut rng).unwrap());

                    assert_eq!(next.len(), 11);
                    let ids: Vec<u32> = next.entities().iter().map(|e| e.identity().id).collect();
                    assert_eq!(ids, (0..11).collect::<Vec<u32>>());
                    assert_layered(&next);
                }
            }
        }
    }

    #[test]
    fn it_breeds_only_children_when_nothing_is_kept_or_reseeded() {
        let mut population = scored(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        population.finish(0);
        let params = EvolutionParams::new(0.1, 0.0, 0.0, 100.0).unwrap();
        let mut rng = StdRng::seed_from_u64(12);

        let next = load(&population.evolve_with_rng(&params, &mut rng).unwrap());

        assert_eq!(next.len(), 10);
        assert!(next.entities().iter().all(|e| !e.identity().is_founder()));
    }

    #[test]
    fn it_keeps_elites_verbatim_under_new_ids() {
        let mut population = scored(&[1.0, 9.0, 5.0, 7.0, 3.0, 2.0, 0.0, 4.0, 6.0, 8.0]);
        population.finish(0);
        let params = EvolutionParams::new(0.0, 0.0, 30.0, 100.0).unwrap();
        let mut rng = StdRng::seed_from_u64(13);

        let next = load(&population.evolve_with_rng(&params, &mut rng).unwrap());

        for rank in 0..3 {
            let elite = &population.entities()[rank];
            let copy = &next.entities()[rank];
            assert_eq!(copy.identity().id, rank as u32);
            assert_eq!(
                genome::encode_topology(copy.network()),
                genome::encode_topology(elite.network())
            );
        }
        assert!(next.entities()[3..].iter().all(|e| !e.identity().is_founder()));
    }

    #[test]
    fn it_draws_parents_from_the_top_ranks_only() {
        let mut population = scored(&[1.0, 9.0, 5.0, 7.0, 3.0, 2.0, 0.0, 4.0, 6.0, 8.0]);
        population.finish(0);
        // top 20%: slots 1 (9.0) and 9 (8.0)
        let params = EvolutionParams::new(0.0, 0.0, 0.0, 20.0).unwrap();
        let mut rng = StdRng::seed_from_u64(14);

        let next = load(&population.evolve_with_rng(&params, &mut rng).unwrap());

        for child in next.entities() {
            assert!(matches!(child.identity().mother_id, Some(1) | Some(9)));
            assert!(matches!(child.identity().father_id, Some(1) | Some(9)));
        }
    }

    #[test]
    fn it_reseeds_the_reserved_slots() {
        let mut population = scored(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        population.finish(0);
        let params = EvolutionParams::new(0.0, 40.0, 10.0, 50.0).unwrap();
        let mut rng = StdRng::seed_from_u64(15);

        let next = load(&population.evolve_with_rng(&params, &mut rng).unwrap());

        let founders = next
            .entities()
            .iter()
            .filter(|e| e.identity().is_founder())
            .count();
        // the elite is a founder as well
        assert_eq!(founders, 1 + 4);
        assert!(next.entities()[6..].iter().all(|e| e.identity().is_founder()));
    }

    #[test]
    fn it_reseeds_when_there_are_no_parents() {
        let mut population = scored(&[1.0, 2.0, 3.0, 4.0]);
        population.finish(0);
        let params = EvolutionParams::new(0.0, 0.0, 0.0, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(16);

        let next = load(&population.evolve_with_rng(&params, &mut rng).unwrap());

        assert_eq!(next.len(), 4);
        assert!(next.entities().iter().all(|e| e.identity().is_founder()));
    }

    #[test]
    fn it_evolves_an_empty_population_to_nothing() {
        let population = load("");
        let params = EvolutionParams::new(0.1, 20.0, 10.0, 20.0).unwrap();

        assert_eq!(population.evolve(&params).unwrap(), "");
        assert!(population.next_generation(&params).unwrap().is_empty());
    }

    #[test]
    fn it_advances_the_iteration() {
        let mut population = population(6, 17);
        population.finish(2);
        let params = EvolutionParams::new(0.1, 20.0, 10.0, 50.0).unwrap();

        let next = population.next_generation(&params).unwrap();

        assert_eq!(next.iteration(), 3);
        assert_eq!(next.len(), 6);
    }
}
