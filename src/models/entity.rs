use super::genome::{self, GenomeError};
use super::identity::Identity;
use super::network::{Network, Topology};
use rand::Rng;
use std::fmt;
use std::time::{Duration, Instant};

type Scorer = Box<dyn Fn() -> f64>;

/// One evolvable individual: an identity plus the network it drives.
pub struct Entity {
    identity: Identity,
    network: Network,
    timings: Vec<Duration>,
    scorer: Option<Scorer>,
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("identity", &self.identity)
            .field("network", &self.network)
            .field("timings", &self.timings.len())
            .field("scorer", &self.scorer.is_some())
            .finish()
    }
}

impl Entity {
    pub fn new(identity: Identity, network: Network) -> Self {
        Self {
            identity,
            network,
            timings: Vec::new(),
            scorer: None,
        }
    }

    /// Founder with a freshly generated network.
    pub fn random<R: Rng>(rng: &mut R, id: u32, topology: &Topology) -> Self {
        Self::new(
            Identity::founder(id),
            genome::random_network(rng, topology),
        )
    }

    pub fn from_genome(genome: &str) -> Result<Self, GenomeError> {
        let (identity, network) = genome::decode(genome)?;
        Ok(Self::new(identity, network))
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Lets the driver record fitness, age or speed directly.
    pub fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn fitness(&self) -> f64 {
        self.identity.fitness
    }

    /// Wall-clock duration of every [`Entity::run`] call so far.
    pub fn timings(&self) -> &[Duration] {
        &self.timings
    }

    /// Evaluates the network for one input vector and returns the outputs in
    /// declaration order.
    pub fn run(&mut self, inputs: &[f64]) -> Vec<f64> {
        let start = Instant::now();
        let outputs = self.network.run(inputs);
        self.timings.push(start.elapsed());
        outputs
    }

    /// Installs the function [`Entity::finish`] uses to score this entity.
    pub fn set_scorer(&mut self, scorer: impl Fn() -> f64 + 'static) {
        self.scorer = Some(Box::new(scorer));
    }

    /// Stores the scorer's result as fitness; 0.0 without a scorer.
    pub fn finish(&mut self) {
        self.identity.fitness = self.scorer.as_ref().map_or(0.0, |score| score());
    }

    pub fn to_genome(&self) -> String {
        genome::encode(&self.identity, &self.network)
    }

    /// Genome of this entity under another id, lineage untouched.
    pub fn to_genome_as(&self, id: u32) -> String {
        genome::encode(&self.identity.renumbered(id), &self.network)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_genome())
    }
}
