use super::entity::Entity;
use super::identity::Identity;
use super::mutagen::MutationRate;
use super::network::{Network, Topology};
use rand::Rng;
use tracing::instrument;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CrossoverError {
    #[error("IncompatibleTopology: mother={mother:?}, father={father:?}")]
    IncompatibleTopology { mother: Topology, father: Topology },
    #[error("IncompatibleLinks: node {node_id} has {mother} links in the mother and {father} in the father")]
    IncompatibleLinks {
        node_id: u32,
        mother: usize,
        father: usize,
    },
}

/// Mixes the genes of two congruent networks into a new one.
///
/// Structure, including every link's endpoints, is copied from the mother.
/// Coefficients and thresholds are then picked position by position through
/// `mutation_rate`. Input nodes carry no genes and are left alone.
#[instrument(level = "debug", skip(rng, mother, father), fields(mutation_rate = mutation_rate.value(), node_count = mother.nodes().len()))]
pub(crate) fn crossover_networks<R: Rng>(
    rng: &mut R,
    mother: &Network,
    father: &Network,
    mutation_rate: &MutationRate,
) -> Result<Network, CrossoverError> {
    let (mother_topology, father_topology) = (mother.topology(), father.topology());
    if mother_topology != father_topology {
        return Err(CrossoverError::IncompatibleTopology {
            mother: mother_topology,
            father: father_topology,
        });
    }

    let mut child = mother.clone();
    child.reset();

    for (mother_layer, father_layer) in mother.layers().iter().zip(father.layers()).skip(1) {
        for (&mother_index, &father_index) in mother_layer.iter().zip(father_layer) {
            let mother_node = mother.node(mother_index);
            let father_node = father.node(father_index);

            if mother_node.incoming().len() != father_node.incoming().len() {
                return Err(CrossoverError::IncompatibleLinks {
                    node_id: mother_node.id(),
                    mother: mother_node.incoming().len(),
                    father: father_node.incoming().len(),
                });
            }

            let coefficient =
                mutation_rate.inherit(rng, mother_node.coefficient(), father_node.coefficient());
            child.set_coefficient(mother_index, coefficient);

            for (&mother_link, &father_link) in
                mother_node.incoming().iter().zip(father_node.incoming())
            {
                let threshold = mutation_rate.inherit(
                    rng,
                    mother.link(mother_link).threshold(),
                    father.link(father_link).threshold(),
                );
                child.set_threshold(mother_link, threshold);
            }
        }
    }

    Ok(child)
}

/// Breeds one child entity with the given id.
pub(crate) fn breed<R: Rng>(
    rng: &mut R,
    id: u32,
    mother: &Entity,
    father: &Entity,
    mutation_rate: &MutationRate,
) -> Result<Entity, CrossoverError> {
    let network = crossover_networks(rng, mother.network(), father.network(), mutation_rate)?;
    let identity = Identity::child(id, mother.identity(), father.identity());

    Ok(Entity::new(identity, network))
}
