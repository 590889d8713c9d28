use crate::{MabossError, Network, Node, NodeId, NodeIdIterator};
use std::collections::{HashMap, HashSet};
use std::ops::Index;

/// Tolerance used when checking that an initial state distribution sums to one.
const ISTATE_TOLERANCE: f64 = 1e-9;

impl NodeId {
    /// Convert to the underlying index of the node.
    pub fn to_index(self) -> usize {
        self.0
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        NodeId(value)
    }
}

/// Basic methods for safely building `Network`s.
impl Network {
    /// Create a new `Network` from the given nodes. The ordering of the nodes is preserved.
    ///
    /// All nodes start with a uniform initial state distribution.
    pub fn new(nodes: Vec<Node>) -> Result<Network, MabossError> {
        let mut network = Network {
            nodes: Vec::new(),
            initial_states: Vec::new(),
            node_to_index: HashMap::new(),
        };
        for node in nodes {
            network.add_node(node)?;
        }
        Ok(network)
    }

    /// Add a new `Node` to this `Network`. The node name must not be used by any other node.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, MabossError> {
        if self.node_to_index.contains_key(node.get_name()) {
            return Err(MabossError::InvalidIdentifier(format!(
                "Node `{}` already exists.",
                node.get_name()
            )));
        }
        let id = NodeId(self.nodes.len());
        self.node_to_index.insert(node.get_name().clone(), id);
        self.nodes.push(node);
        self.initial_states.push([0.5, 0.5]);
        Ok(id)
    }

    /// Replace the node with the given `name` by a new version of the same node.
    pub fn set_node(&mut self, name: &str, node: Node) -> Result<(), MabossError> {
        let id = self.get_node_id(name)?;
        if node.get_name() != name {
            return Err(MabossError::InvalidIdentifier(format!(
                "Cannot replace node `{}` with node `{}`.",
                name,
                node.get_name()
            )));
        }
        self.nodes[id.0] = node;
        Ok(())
    }

    /// Mark the node with the given `name` as internal (or observable).
    pub fn set_internal(&mut self, name: &str, is_internal: bool) -> Result<(), MabossError> {
        let id = self.get_node_id(name)?;
        self.nodes[id.0].set_internal(is_internal);
        Ok(())
    }

    /// Set the initial state distribution `[P(node = 0), P(node = 1)]` of a node.
    pub fn set_istate(&mut self, name: &str, istate: [f64; 2]) -> Result<(), MabossError> {
        let id = self.get_node_id(name)?;
        let [inactive, active] = istate;
        let is_probability = |p: f64| p.is_finite() && (0.0..=1.0).contains(&p);
        if !is_probability(inactive)
            || !is_probability(active)
            || (inactive + active - 1.0).abs() > ISTATE_TOLERANCE
        {
            return Err(MabossError::InvalidParameter(format!(
                "Initial state {:?} of `{}` is not a probability distribution.",
                istate, name
            )));
        }
        self.initial_states[id.0] = istate;
        Ok(())
    }

    /// **(internal)** Utility method to safely obtain a node id (using an appropriate error message).
    fn get_node_id(&self, name: &str) -> Result<NodeId, MabossError> {
        self.find_node(name)
            .ok_or_else(|| MabossError::InvalidIdentifier(format!("Unknown node `{name}`.")))
    }
}

/// Some basic utility methods for inspecting the `Network`.
impl Network {
    /// The number of nodes in this `Network`.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return an iterator over all node ids of this network.
    pub fn nodes(&self) -> NodeIdIterator {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Find a `NodeId` for the given name, or `None` if the node does not exist.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.node_to_index.get(name).cloned()
    }

    /// True if a node with the given `name` is part of this network.
    pub fn contains(&self, name: &str) -> bool {
        self.node_to_index.contains_key(name)
    }

    pub fn get_node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Shorthand for `self.get_node(id).get_name()`.
    pub fn get_node_name(&self, id: NodeId) -> &String {
        self.nodes[id.0].get_name()
    }

    pub fn get_istate(&self, id: NodeId) -> [f64; 2] {
        self.initial_states[id.0]
    }

    /// Copy the node names from this network into a separate vector.
    pub fn node_names(&self) -> Vec<String> {
        self.nodes.iter().map(|it| it.get_name().clone()).collect()
    }

    /// Names of nodes which are not internal, i.e. which appear in state labels.
    pub fn output_nodes(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|it| !it.is_internal())
            .map(|it| it.get_name().clone())
            .collect()
    }

    /// Check that the logic and rates of every node only reference nodes of this network.
    pub fn check_logic_defined(&self) -> Result<(), MabossError> {
        let known = self.node_names().into_iter().collect::<HashSet<_>>();
        for node in &self.nodes {
            if let Some(logic) = node.get_logic() {
                logic.validate(&known)?;
            }
            node.rate_up().validate(&known)?;
            node.rate_down().validate(&known)?;
        }
        Ok(())
    }
}

impl Index<NodeId> for Network {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output {
        self.get_node(index)
    }
}
