//! A library for preparing stochastic Boolean network models for the MaBoSS simulator
//! and for reconstructing and aggregating the results it produces.
//!
//! The library covers two independent parts of a MaBoSS workflow:
//!
//!  1. Before simulation, a `Network` of `Node`s (each with a `logic` and a pair of
//!     rate expressions) is wrapped in a `Simulation` which holds the run configuration.
//!     Nodes can be *mutated*: their rates are rewritten into gated expressions which are
//!     controlled by two external parameters (`$Low_<node>` and `$High_<node>`), so that
//!     a node can be switched between wild-type, forced-ON and forced-OFF behaviour
//!     without regenerating the model. The `.bnd` and `.cfg` files are produced using
//!     the `Display` implementations of `Network` and `Simulation`.
//!
//!  2. After simulation, the sparse exports of the simulator are turned into dense
//!     probability tables (see the `result` module), and results of many independently
//!     simulated models are aggregated into steady-state distributions which can be
//!     queried using simple threshold predicates (see the `ensemble` module).
//!
//! Running the simulator itself is not a concern of this library.

#[macro_use]
extern crate lazy_static;

use regex::Regex;
use std::collections::HashMap;
use std::iter::Map;
use std::ops::Range;

pub mod ensemble;
pub mod expression;
pub mod result;
pub mod simulation;
pub mod state_label;

/// **(internal)** The `MabossError` type and its trait implementations.
mod error;
/// **(internal)** Utility methods for `Network`.
mod _impl_network;
/// **(internal)** `Network` to `.bnd` string.
mod _impl_network_display;
/// **(internal)** Utility methods for `Node` and `RateLogic`.
mod _impl_node;
/// **(internal)** Mutant rate rewriting and `MutationState`.
mod _impl_mutation;

pub use _impl_mutation::{high_parameter, low_parameter, FORCED_RATE};
pub use error::MabossError;

use crate::expression::RateExpr;

lazy_static! {
    /// A regular expression that matches valid node identifiers.
    static ref ID_REGEX: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
}

/// A type-safe index of a `Node` inside a `Network`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(usize);

/// Rate expressions of a `Node`.
///
/// Once a node is mutated, its original rates are retained next to the gated ones, so
/// that the node can always be rewritten again from its original rates (e.g. when the
/// number of mutated nodes in the network changes).
#[derive(Clone, Debug, PartialEq)]
pub enum RateLogic {
    Unmutated {
        up: RateExpr,
        down: RateExpr,
    },
    Mutated {
        original: (RateExpr, RateExpr),
        gated: (RateExpr, RateExpr),
    },
}

/// A node of a `Network`.
///
/// Each node has a `name`, an optional `logic` (a Boolean expression over other nodes,
/// referenced as `@logic` from the rates), and a `RateLogic` describing the rate of its
/// activation and inactivation. Internal nodes are simulated, but they do not appear
/// in the state labels reported by the simulator.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    name: String,
    logic: Option<RateExpr>,
    rates: RateLogic,
    is_internal: bool,
}

/// One of the three recognized perturbations of a mutable node.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MutationState {
    /// The node is forced to be active (`$Low = 0`, `$High = 1`).
    On,
    /// The node is forced to be inactive (`$Low = 1`, `$High = 0`).
    Off,
    /// The original logic of the node applies (`$Low = 0`, `$High = 0`).
    WildType,
}

/// A stochastic Boolean network in the sense of MaBoSS.
///
/// Apart from the nodes, the network keeps the initial state distribution of every
/// node as a pair `[P(node = 0), P(node = 1)]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    nodes: Vec<Node>,
    initial_states: Vec<[f64; 2]>,
    node_to_index: HashMap<String, NodeId>,
}

/// An iterator over all `NodeId`s of a `Network`.
pub type NodeIdIterator = Map<Range<usize>, fn(usize) -> NodeId>;
