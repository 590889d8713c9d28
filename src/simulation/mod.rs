//! The configuration of a single simulator run.
//!
//! A `Simulation` owns a `Network` together with everything else the simulator needs to
//! know: engine parameters (`time_tick`, `max_time`, ...), global `$` constants, the list
//! of mutable nodes and the reference states. The `.bnd` file of a run is the `Display`
//! of its network, and the `.cfg` file is the `Display` of the `Simulation` itself.
//!
//! ```rust
//! use biodivine_lib_maboss::simulation::Simulation;
//! use biodivine_lib_maboss::{MutationState, Network, Node};
//!
//! let network = Network::new(vec![
//!     Node::new("A", "!B").unwrap(),
//!     Node::new("B", "A").unwrap(),
//! ]).unwrap();
//! let mut simulation = Simulation::new(network);
//! simulation.update_parameter("max_time", 10.0).unwrap();
//! simulation.mutate("A", "ON").unwrap();
//! assert_eq!(Some(MutationState::On), simulation.mutation_state("A").unwrap());
//! assert!(simulation.to_string().starts_with("$nb_mutable = 1;\n"));
//! ```

use crate::Network;
use std::collections::BTreeMap;

/// **(internal)** Parameter store, mutations and continuation of `Simulation`s.
mod _impl_simulation;
/// **(internal)** `Simulation` to `.cfg` string.
mod _impl_simulation_cfg;
/// **(internal)** Temporary directories with the input files of a run.
mod _impl_workspace;

/// Engine parameters recognized by the simulator, with their default values.
pub const DEFAULT_PARAMETERS: [(&str, f64); 11] = [
    ("time_tick", 0.1),
    ("max_time", 4.0),
    ("sample_count", 10000.0),
    ("discrete_time", 0.0),
    ("use_physrandgen", 1.0),
    ("seed_pseudorandom", 0.0),
    ("display_traj", 0.0),
    ("statdist_traj_count", 0.0),
    ("statdist_cluster_threshold", 1.0),
    ("thread_count", 1.0),
    ("statdist_similarity_cache_max_size", 20000.0),
];

/// Name of the global constant holding the number of mutable nodes (without the `$`).
pub const NB_MUTABLE: &str = "nb_mutable";

/// A network together with the configuration of its simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct Simulation {
    network: Network,
    // Engine parameters, always containing every key of `DEFAULT_PARAMETERS`.
    parameters: BTreeMap<String, f64>,
    // Global constants, stored without the `$` prefix.
    globals: BTreeMap<String, f64>,
    // Mutable nodes in the order in which they were mutated.
    mutations: Vec<String>,
    refstate: BTreeMap<String, bool>,
}

/// A temporary directory holding the `<prefix>.bnd` and `<prefix>.cfg` files of one run,
/// into which the simulator is expected to write its `<prefix>_*.csv` exports.
///
/// The directory and everything in it is removed when the `Workspace` is dropped.
#[derive(Debug)]
pub struct Workspace {
    directory: tempfile::TempDir,
    prefix: String,
}
