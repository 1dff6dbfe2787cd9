//! Flat text codec for entities and populations.
//!
//! ```text
//! population := entity ('#' entity)*
//! entity     := identity '|' topology
//! identity   := id '-' generation '-' originGeneration '-' motherId '-' fatherId
//! topology   := group ('@' group)*          first group = inputs, last = outputs
//! group      := node ('&' node)*
//! input-node := id
//! node       := id ';' coefficient ';' linklist
//! linklist   := link ('-' link)*
//! link       := sourceId ',' threshold
//! ```
//!
//! Floats are written with `f64`'s shortest round-trip `Display`, which never
//! uses exponent notation, so a value can not collide with `-`.

use super::identity::Identity;
use super::network::{Network, NodeIndex, NodeKind, Topology};
use rand::Rng;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::str::FromStr;
use tracing::instrument;

pub const ENTITY_SEPARATOR: &str = "#";
pub const CATEGORY_SEPARATOR: &str = "|";
pub const GROUP_SEPARATOR: &str = "@";
pub const NODE_SEPARATOR: &str = "&";
pub const GENE_SEPARATOR: &str = ";";
pub const PROPERTY_SEPARATOR: &str = "-";
pub const SUB_GENE_SEPARATOR: &str = ",";

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum GenomeError {
    #[error("MissingTopology: no '|' separating identity from topology in {genome:?}")]
    MissingTopology { genome: String },
    #[error("MissingLayers: expected an input and an output group, got {groups} in {topology:?}")]
    MissingLayers { groups: usize, topology: String },
    #[error("IdentityFieldCount: expected at least 5 fields, got {count} in {identity:?}")]
    IdentityFieldCount { count: usize, identity: String },
    #[error("InvalidNumber: {field}={value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("MalformedNode: {node:?}")]
    MalformedNode { node: String },
    #[error("MalformedLink: {link:?}")]
    MalformedLink { link: String },
    #[error("DuplicateNode: id={id}")]
    DuplicateNode { id: u32 },
    #[error("UnresolvedSource: node {destination_id} links from unknown node {source_id}")]
    UnresolvedSource { source_id: u32, destination_id: u32 },
    #[error("LinkOrder: node {destination_id} links from node {source_id}, which is not a lower id in the preceding layer")]
    LinkOrder { source_id: u32, destination_id: u32 },
}

impl GenomeError {
    pub(crate) fn invalid_number(field: &'static str, value: &str) -> Self {
        Self::InvalidNumber {
            field,
            value: value.to_string(),
        }
    }
}

fn parse_number<T: FromStr>(field: &'static str, value: &str) -> Result<T, GenomeError> {
    value
        .parse()
        .map_err(|_| GenomeError::invalid_number(field, value))
}

fn parse_gene(field: &'static str, value: &str) -> Result<f64, GenomeError> {
    let gene: f64 = parse_number(field, value)?;
    if !gene.is_finite() {
        return Err(GenomeError::invalid_number(field, value));
    }
    Ok(gene)
}

fn parse_input(token: &str) -> Result<u32, GenomeError> {
    if token.contains(GENE_SEPARATOR) {
        return Err(GenomeError::MalformedNode {
            node: token.to_string(),
        });
    }
    parse_number("node_id", token)
}

/// Parses `id;coefficient;source,threshold-source,threshold`.
fn parse_node(token: &str) -> Result<(u32, f64, Vec<(u32, f64)>), GenomeError> {
    let fields: Vec<&str> = token.split(GENE_SEPARATOR).collect();
    let [id, coefficient, links] = fields.as_slice() else {
        return Err(GenomeError::MalformedNode {
            node: token.to_string(),
        });
    };
    if links.is_empty() {
        return Err(GenomeError::MalformedNode {
            node: token.to_string(),
        });
    }

    let id = parse_number("node_id", id)?;
    let coefficient = parse_gene("coefficient", coefficient)?;
    let links = links
        .split(PROPERTY_SEPARATOR)
        .map(parse_link)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((id, coefficient, links))
}

fn parse_link(token: &str) -> Result<(u32, f64), GenomeError> {
    let Some((source, threshold)) = token.split_once(SUB_GENE_SEPARATOR) else {
        return Err(GenomeError::MalformedLink {
            link: token.to_string(),
        });
    };

    Ok((
        parse_number("source_id", source)?,
        parse_gene("threshold", threshold)?,
    ))
}

/// Rebuilds a network from the topology part of a genome.
///
/// Nodes are created group by group first; links are resolved against the
/// resulting id map afterwards, so any unknown source id fails the decode.
/// Every link must come from a lower id in the immediately preceding group.
#[instrument(level = "debug", skip(topology), fields(topology_length = topology.len()))]
pub fn decode_topology(topology: &str) -> Result<Network, GenomeError> {
    let groups: Vec<&str> = topology.split(GROUP_SEPARATOR).collect();
    if groups.len() < 2 {
        return Err(GenomeError::MissingLayers {
            groups: groups.len(),
            topology: topology.to_string(),
        });
    }

    let last = groups.len() - 1;
    let mut network = Network::default();
    let mut by_id: HashMap<u32, NodeIndex> = HashMap::new();
    // (source id, destination id, threshold)
    let mut pending: Vec<(u32, u32, f64)> = Vec::new();

    for (position, group) in groups.iter().enumerate() {
        let layer = network.push_layer();

        for token in group.split(NODE_SEPARATOR) {
            let (id, kind, coefficient) = if position == 0 {
                (parse_input(token)?, NodeKind::Input, 0.0)
            } else {
                let (id, coefficient, links) = parse_node(token)?;
                pending.extend(
                    links
                        .into_iter()
                        .map(|(source_id, threshold)| (source_id, id, threshold)),
                );
                let kind = if position == last {
                    NodeKind::Output
                } else {
                    NodeKind::Hidden
                };
                (id, kind, coefficient)
            };

            match by_id.entry(id) {
                Entry::Occupied(_) => return Err(GenomeError::DuplicateNode { id }),
                Entry::Vacant(slot) => {
                    slot.insert(network.push_node(layer, id, kind, coefficient));
                }
            }
        }
    }

    for (source_id, destination_id, threshold) in pending {
        let unresolved = GenomeError::UnresolvedSource {
            source_id,
            destination_id,
        };
        let source = by_id.get(&source_id).copied().ok_or(unresolved.clone())?;
        let destination = by_id.get(&destination_id).copied().ok_or(unresolved)?;

        if network.node(source).layer() + 1 != network.node(destination).layer()
            || source_id >= destination_id
        {
            return Err(GenomeError::LinkOrder {
                source_id,
                destination_id,
            });
        }

        network.connect(source, destination, threshold);
    }

    Ok(network)
}

/// Splits one entity genome into its identity and its network.
pub fn decode(genome: &str) -> Result<(Identity, Network), GenomeError> {
    let Some((identity, topology)) = genome.split_once(CATEGORY_SEPARATOR) else {
        return Err(GenomeError::MissingTopology {
            genome: genome.to_string(),
        });
    };

    Ok((Identity::decode(identity)?, decode_topology(topology)?))
}

fn encode_node(network: &Network, index: NodeIndex) -> String {
    let node = network.node(index);
    if node.kind() == NodeKind::Input {
        return node.id().to_string();
    }

    let links: Vec<String> = node
        .incoming()
        .iter()
        .map(|&link| {
            let link = network.link(link);
            format!(
                "{}{SUB_GENE_SEPARATOR}{}",
                network.node(link.source()).id(),
                link.threshold()
            )
        })
        .collect();

    format!(
        "{}{GENE_SEPARATOR}{}{GENE_SEPARATOR}{}",
        node.id(),
        node.coefficient(),
        links.join(PROPERTY_SEPARATOR)
    )
}

pub fn encode_topology(network: &Network) -> String {
    network
        .layers()
        .iter()
        .map(|layer| {
            layer
                .iter()
                .map(|&index| encode_node(network, index))
                .collect::<Vec<_>>()
                .join(NODE_SEPARATOR)
        })
        .collect::<Vec<_>>()
        .join(GROUP_SEPARATOR)
}

pub fn encode(identity: &Identity, network: &Network) -> String {
    format!("{identity}{CATEGORY_SEPARATOR}{}", encode_topology(network))
}

/// Draws a coefficient or threshold in [0, 1).
pub(crate) fn random_gene<R: Rng>(rng: &mut R) -> f64 {
    rng.random_range(0.0..1.0)
}

/// Builds a densely connected network with random genes.
///
/// Ids run sequentially across layers; each hidden or output node gets one
/// link per node of the previous layer.
#[instrument(level = "debug", skip(rng), fields(node_count = topology.node_count()))]
pub fn random_network<R: Rng>(rng: &mut R, topology: &Topology) -> Network {
    let mut network = Network::default();
    let mut next_id = 0u32;
    let mut previous: Vec<NodeIndex> = Vec::new();
    let sizes = topology.layer_sizes();
    let last = sizes.len() - 1;

    for (position, &size) in sizes.iter().enumerate() {
        let layer = network.push_layer();
        let kind = match position {
            0 => NodeKind::Input,
            p if p == last => NodeKind::Output,
            _ => NodeKind::Hidden,
        };

        let mut current = Vec::with_capacity(size);
        for _ in 0..size {
            let index = if kind == NodeKind::Input {
                network.push_node(layer, next_id, kind, 0.0)
            } else {
                let coefficient = random_gene(rng);
                let index = network.push_node(layer, next_id, kind, coefficient);
                for &source in &previous {
                    let threshold = random_gene(rng);
                    network.connect(source, index, threshold);
                }
                index
            };
            current.push(index);
            next_id += 1;
        }
        previous = current;
    }

    network
}

/// Genome of a brand new founder entity.
pub fn generate<R: Rng>(rng: &mut R, id: u32, topology: &Topology) -> String {
    encode(&Identity::founder(id), &random_network(rng, topology))
}

/// Splits a serialized population into entity genomes.
pub fn split_population(population: &str) -> impl Iterator<Item = &str> {
    population.split(ENTITY_SEPARATOR)
}
