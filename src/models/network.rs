//! Arena-backed feed-forward threshold networks.
//!
//! Nodes and links live in flat vectors and refer to each other through
//! [`NodeIndex`] and [`LinkIndex`] handles. A network is built once (by the
//! genome codec or by breeding) and then only has its activations rewritten
//! by [`Network::run`]; nodes are never removed individually.

use serde::{Deserialize, Serialize};

/// Handle of a node inside its owning [`Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) usize);

/// Handle of a link inside its owning [`Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkIndex(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Input,
    Hidden,
    Output,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: u32,
    pub(crate) kind: NodeKind,
    pub(crate) layer: usize,
    pub(crate) coefficient: f64,
    pub(crate) incoming: Vec<LinkIndex>,
    pub(crate) outgoing: Vec<LinkIndex>,
    pub(crate) value: f64,
}

impl Node {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Position of the layer holding this node, 0 being the input layer.
    pub fn layer(&self) -> usize {
        self.layer
    }

    /// Scalar applied to the fraction of active incoming links. Input nodes carry 0.
    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Activation computed by the last [`Network::run`].
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn incoming(&self) -> &[LinkIndex] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &[LinkIndex] {
        &self.outgoing
    }
}

/// Directed edge owned by its destination node.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub(crate) source: NodeIndex,
    pub(crate) destination: NodeIndex,
    pub(crate) threshold: f64,
}

impl Link {
    pub fn source(&self) -> NodeIndex {
        self.source
    }

    pub fn destination(&self) -> NodeIndex {
        self.destination
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// A link is active while its source's activation meets or exceeds the threshold.
    pub fn is_active(&self, network: &Network) -> bool {
        network.nodes[self.source.0].value >= self.threshold
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TopologyError {
    #[error("NoInputs: a network needs at least one input node")]
    NoInputs,
    #[error("NoOutputs: a network needs at least one output node")]
    NoOutputs,
    #[error("EmptyHiddenLayer: hidden layer {layer} has no nodes")]
    EmptyHiddenLayer { layer: usize },
}

/// Layer shape of a network: input count, hidden layer sizes, output count.
///
/// Every entity of a population shares one topology for the population's
/// lifetime, which is what lets crossover align parents position by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub inputs: usize,
    pub hidden: Vec<usize>,
    pub outputs: usize,
}

impl Topology {
    pub fn new(inputs: usize, hidden: Vec<usize>, outputs: usize) -> Result<Self, TopologyError> {
        let topology = Self {
            inputs,
            hidden,
            outputs,
        };
        topology.validate()?;

        Ok(topology)
    }

    pub fn validate(&self) -> Result<(), TopologyError> {
        if self.inputs == 0 {
            return Err(TopologyError::NoInputs);
        }

        if self.outputs == 0 {
            return Err(TopologyError::NoOutputs);
        }

        if let Some(layer) = self.hidden.iter().position(|&size| size == 0) {
            return Err(TopologyError::EmptyHiddenLayer { layer });
        }

        Ok(())
    }

    /// Sizes of every layer in evaluation order.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden.len() + 2);
        sizes.push(self.inputs);
        sizes.extend_from_slice(&self.hidden);
        sizes.push(self.outputs);
        sizes
    }

    pub fn node_count(&self) -> usize {
        self.layer_sizes().iter().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    nodes: Vec<Node>,
    links: Vec<Link>,
    layers: Vec<Vec<NodeIndex>>,
}

impl Network {
    pub(crate) fn push_layer(&mut self) -> usize {
        self.layers.push(Vec::new());
        self.layers.len() - 1
    }

    /// Appends a node to an already pushed layer.
    pub(crate) fn push_node(
        &mut self,
        layer: usize,
        id: u32,
        kind: NodeKind,
        coefficient: f64,
    ) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        self.nodes.push(Node {
            id,
            kind,
            layer,
            coefficient,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            value: 0.0,
        });
        self.layers[layer].push(index);
        index
    }

    /// Attaches a link to the source's outgoing and the destination's incoming list.
    pub(crate) fn connect(
        &mut self,
        source: NodeIndex,
        destination: NodeIndex,
        threshold: f64,
    ) -> LinkIndex {
        let index = LinkIndex(self.links.len());
        self.links.push(Link {
            source,
            destination,
            threshold,
        });
        self.nodes[source.0].outgoing.push(index);
        self.nodes[destination.0].incoming.push(index);
        index
    }

    pub(crate) fn set_coefficient(&mut self, node: NodeIndex, coefficient: f64) {
        self.nodes[node.0].coefficient = coefficient;
    }

    pub(crate) fn set_threshold(&mut self, link: LinkIndex, threshold: f64) {
        self.links[link.0].threshold = threshold;
    }

    /// Zeroes every activation.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.value = 0.0;
        }
    }

    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.0]
    }

    pub fn link(&self, index: LinkIndex) -> &Link {
        &self.links[index.0]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn layers(&self) -> &[Vec<NodeIndex>] {
        &self.layers
    }

    pub fn inputs(&self) -> &[NodeIndex] {
        self.layers.first().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn outputs(&self) -> &[NodeIndex] {
        if self.layers.len() < 2 {
            return &[];
        }
        self.layers.last().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn hidden_layers(&self) -> &[Vec<NodeIndex>] {
        if self.layers.len() < 2 {
            return &[];
        }
        &self.layers[1..self.layers.len() - 1]
    }

    /// Looks a node up by its genome id.
    pub fn find(&self, id: u32) -> Option<NodeIndex> {
        self.nodes.iter().position(|node| node.id == id).map(NodeIndex)
    }

    pub fn topology(&self) -> Topology {
        Topology {
            inputs: self.inputs().len(),
            hidden: self.hidden_layers().iter().map(Vec::len).collect(),
            outputs: self.outputs().len(),
        }
    }

    /// Fraction of active incoming links times the coefficient.
    ///
    /// A node without incoming links evaluates to 0.0 rather than 0/0.
    fn activate(&self, index: NodeIndex) -> f64 {
        let node = &self.nodes[index.0];
        if node.incoming.is_empty() {
            return 0.0;
        }

        let active = node
            .incoming
            .iter()
            .filter(|&&link| self.links[link.0].is_active(self))
            .count();

        active as f64 / node.incoming.len() as f64 * node.coefficient
    }

    /// Feeds `inputs` to the input layer by position and evaluates the
    /// remaining layers in order, returning the output activations.
    ///
    /// Missing inputs read as 0.0, surplus inputs are ignored.
    pub fn run(&mut self, inputs: &[f64]) -> Vec<f64> {
        let Some(input_layer) = self.layers.first() else {
            return Vec::new();
        };

        for (position, &index) in input_layer.iter().enumerate() {
            self.nodes[index.0].value = inputs.get(position).copied().unwrap_or(0.0);
        }

        for layer in 1..self.layers.len() {
            for position in 0..self.layers[layer].len() {
                let index = self.layers[layer][position];
                self.nodes[index.0].value = self.activate(index);
            }
        }

        self.outputs()
            .iter()
            .map(|&index| self.nodes[index.0].value)
            .collect()
    }

    /// Activations of every node, in arena order.
    pub fn values(&self) -> Vec<f64> {
        self.nodes.iter().map(|node| node.value).collect()
    }
}
