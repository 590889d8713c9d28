use crate::result::ResultSource;
use crate::simulation::{Simulation, DEFAULT_PARAMETERS, NB_MUTABLE};
use crate::{high_parameter, low_parameter, MabossError, MutationState, Network, ID_REGEX};
use std::collections::BTreeMap;
use std::str::FromStr;

impl Simulation {
    /// Create a new `Simulation` of the given `network` with default engine parameters,
    /// no global constants and no mutations.
    pub fn new(network: Network) -> Simulation {
        Simulation {
            network,
            parameters: DEFAULT_PARAMETERS
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
            globals: BTreeMap::new(),
            mutations: Vec::new(),
            refstate: BTreeMap::new(),
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Names of the mutable nodes, in the order in which they were first mutated.
    pub fn mutations(&self) -> &[String] {
        &self.mutations
    }

    /// Value of an engine parameter, or of a global constant if `name` starts with `$`.
    pub fn get_parameter(&self, name: &str) -> Option<f64> {
        if let Some(global) = name.strip_prefix('$') {
            if global == NB_MUTABLE {
                return Some(self.mutations.len() as f64);
            }
            self.globals.get(global).cloned()
        } else {
            self.parameters.get(name).cloned()
        }
    }

    /// Number of threads the simulator should use.
    pub fn thread_count(&self) -> usize {
        self.parameters
            .get("thread_count")
            .map(|it| it.max(1.0) as usize)
            .unwrap_or(1)
    }

    /// Set an engine parameter (one of `DEFAULT_PARAMETERS`) or a global constant (a name
    /// starting with `$`).
    ///
    /// Fails with `InvalidParameter` if the parameter is not known, the value is not finite,
    /// `$nb_mutable` is set explicitly, or the value would set both mutation parameters
    /// of a node at once. Nothing is modified on failure.
    pub fn update_parameter(&mut self, name: &str, value: f64) -> Result<(), MabossError> {
        self.update_parameters(&[(name, value)])
    }

    /// Set several parameters at once. Either all parameters are set, or (on error)
    /// none of them.
    pub fn update_parameters(&mut self, values: &[(&str, f64)]) -> Result<(), MabossError> {
        let mut globals = self.globals.clone();
        let mut parameters = self.parameters.clone();
        for (name, value) in values {
            if !value.is_finite() {
                return Err(MabossError::InvalidParameter(format!(
                    "Value {value} of `{name}` is not finite."
                )));
            }
            if let Some(global) = name.strip_prefix('$') {
                if !ID_REGEX.is_match(global) {
                    return Err(MabossError::InvalidParameter(format!(
                        "Invalid global constant `{name}`."
                    )));
                }
                if global == NB_MUTABLE {
                    return Err(MabossError::InvalidParameter(format!(
                        "`${NB_MUTABLE}` is derived from the number of mutated nodes."
                    )));
                }
                globals.insert(global.to_string(), *value);
            } else if parameters.contains_key(*name) {
                parameters.insert(name.to_string(), *value);
            } else {
                return Err(MabossError::InvalidParameter(format!(
                    "Unknown simulation parameter `{name}`."
                )));
            }
        }
        for node in self.network.node_names() {
            let low = globals.get(&low_parameter(&node)).cloned().unwrap_or(0.0);
            let high = globals.get(&high_parameter(&node)).cloned().unwrap_or(0.0);
            MutationState::try_from_parameters(low, high)?;
        }
        for (name, value) in values {
            tracing::debug!(parameter = name, value, "Simulation parameter updated.");
        }
        self.globals = globals;
        self.parameters = parameters;
        Ok(())
    }

    /// Make `node` mutable and set its mutation `state` (`"ON"`, `"OFF"` or `"WT"`).
    ///
    /// A node is registered as mutable only once. Whenever the number of mutable nodes
    /// changes, the rates of all mutable nodes are regenerated from their original rates,
    /// so that the forced rate is always `1e308` divided by the current number of mutable
    /// nodes. Finally, `$Low_<node>` and `$High_<node>` are set to select the `state`.
    ///
    /// Fails with `InvalidIdentifier` if the node does not exist or the state is not
    /// recognized. Nothing is modified on failure.
    pub fn mutate(&mut self, node: &str, state: &str) -> Result<(), MabossError> {
        let state = MutationState::from_str(state)?;
        if !self.network.contains(node) {
            return Err(MabossError::InvalidIdentifier(format!(
                "Cannot mutate unknown node `{node}`."
            )));
        }
        if !self.mutations.iter().any(|it| it == node) {
            self.mutations.push(node.to_string());
            let count = self.mutations.len();
            for name in &self.mutations {
                if let Some(id) = self.network.find_node(name) {
                    let mutant = self.network[id].to_mutant(count);
                    self.network.set_node(name, mutant)?;
                }
            }
            tracing::debug!(node, mutable = count, "Node registered as mutable.");
        }
        let (low, high) = state.parameter_values();
        self.globals.insert(low_parameter(node), low);
        self.globals.insert(high_parameter(node), high);
        tracing::info!(node, %state, "Node mutated.");
        Ok(())
    }

    /// The current mutation state of `node`, or `None` if the node is not mutable.
    ///
    /// Fails with `InvalidIdentifier` if the node does not exist.
    pub fn mutation_state(&self, node: &str) -> Result<Option<MutationState>, MabossError> {
        if !self.network.contains(node) {
            return Err(MabossError::InvalidIdentifier(format!(
                "Unknown node `{node}`."
            )));
        }
        if !self.mutations.iter().any(|it| it == node) {
            return Ok(None);
        }
        let low = self.globals.get(&low_parameter(node)).cloned().unwrap_or(0.0);
        let high = self.globals.get(&high_parameter(node)).cloned().unwrap_or(0.0);
        MutationState::try_from_parameters(low, high).map(Some)
    }

    /// Set the initial state distribution `[P(node = 0), P(node = 1)]` of a node.
    pub fn set_istate(&mut self, node: &str, istate: [f64; 2]) -> Result<(), MabossError> {
        self.network.set_istate(node, istate)
    }

    /// Set the same initial state distribution for all given nodes. Either all nodes are
    /// updated, or (on error) none of them.
    pub fn set_nodes_istate(&mut self, nodes: &[&str], istate: [f64; 2]) -> Result<(), MabossError> {
        let mut network = self.network.clone();
        for node in nodes {
            network.set_istate(node, istate)?;
        }
        self.network = network;
        Ok(())
    }

    /// Mark a node as internal (or observable).
    pub fn set_internal(&mut self, node: &str, is_internal: bool) -> Result<(), MabossError> {
        self.network.set_internal(node, is_internal)
    }

    /// Set the value of `node` in the reference state of the simulation.
    pub fn set_reference_state(&mut self, node: &str, value: bool) -> Result<(), MabossError> {
        if !self.network.contains(node) {
            return Err(MabossError::InvalidIdentifier(format!(
                "Unknown node `{node}`."
            )));
        }
        self.refstate.insert(node.to_string(), value);
        Ok(())
    }

    /// The reference state value of `node`, if set.
    pub fn get_reference_state(&self, node: &str) -> Option<bool> {
        self.refstate.get(node).cloned()
    }

    /// Create a copy of this simulation which starts where the given `result` ended.
    ///
    /// For every node which appears in the node probability table of the result, the
    /// initial state of the copy is `[1 - p, p]`, where `p` is the probability of the node
    /// at the last time point. Other nodes keep their initial state.
    pub fn continue_from(&self, result: &dyn ResultSource) -> Result<Simulation, MabossError> {
        let nodes = result.nodes_probtraj()?;
        let last = nodes.num_rows().checked_sub(1).ok_or_else(|| {
            MabossError::MalformedExport("Trajectory has no time points.".to_string())
        })?;
        let mut copy = self.clone();
        for (node, probability) in nodes.columns().iter().zip(nodes.row(last)) {
            // Rounding of the export can push the sum of probabilities slightly above one.
            let p = probability.clamp(0.0, 1.0);
            copy.network.set_istate(node, [1.0 - p, p])?;
        }
        tracing::debug!(nodes = nodes.num_columns(), "Simulation continued from result.");
        Ok(copy)
    }
}
