//! Reconstruction of dense probability tables from the sparse exports of the simulator.
//!
//! The simulator reports, for every sampled time point, only the compound states which were
//! actually visited, each with its probability (a `ProbTrajRow`). The functions in this
//! module turn a list of such rows into a dense `TrajectoryTable`, where every visited
//! compound state has its own column and the states which were not visited at some time
//! point have probability exactly zero. A node table can be then derived from the state
//! table by summing, for every node, the probabilities of all states in which it is active.
//!
//! ```rust
//! use biodivine_lib_maboss::result::{build_node_table, build_state_table, ProbTrajRow};
//!
//! let rows = vec![
//!     ProbTrajRow::new(0.0, vec![("A -- B".to_string(), 0.6), ("<nil>".to_string(), 0.4)]),
//!     ProbTrajRow::new(0.5, vec![("B -- A".to_string(), 1.0)]),
//! ];
//! let states = build_state_table(&rows).unwrap();
//! assert_eq!(vec!["<nil>", "A -- B"], states.columns());
//! assert_eq!(Some(1.0), states.get(1, "A -- B"));
//!
//! let nodes = build_node_table(&rows).unwrap();
//! assert_eq!(vec!["A", "B"], nodes.columns());
//! assert_eq!(Some(0.6), nodes.get(0, "B"));
//! ```
//!
//! Results of a simulation are accessed through the `ResultSource` trait, which is
//! implemented by `StoredResult` (exports written to disk by the simulator) and
//! `MemoryResult` (rows which are already in memory).

use fxhash::FxHashMap;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// **(internal)** `FixedPointTable` construction, parsing and display.
mod _impl_fixed_point_table;
/// **(internal)** Utility methods for `ProbabilityTable`.
mod _impl_probability_table;
/// **(internal)** Parser of the sparse trajectory export.
mod _impl_probtraj_parser;
/// **(internal)** `StoredResult` and `MemoryResult`.
mod _impl_result_source;
/// **(internal)** State and node table builders.
mod _impl_state_table;

pub(crate) use _impl_probability_table::{node_index, project_row};
pub use _impl_fixed_point_table::parse_fixed_points;
pub use _impl_probtraj_parser::parse_probtraj;
pub use _impl_state_table::{build_node_table, build_state_table};

use crate::MabossError;

/// Probability rows of an export may sum above one by at most this amount (the simulator
/// prints rounded probabilities). Sums below one are always accepted, since the simulator
/// does not report very rarely visited states.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// One time point of a sparse trajectory export: the visited compound states and
/// their probabilities.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbTrajRow {
    time: f64,
    states: Vec<(String, f64)>,
}

/// A dense table of probabilities.
///
/// Rows are identified by an index value of type `R` (time for trajectories, model id for
/// ensemble distributions) and columns by compound state labels or node names. Columns are
/// always sorted lexicographically.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbabilityTable<R> {
    index: Vec<R>,
    columns: Vec<String>,
    column_index: FxHashMap<String, usize>,
    values: Vec<Vec<f64>>,
}

/// A `ProbabilityTable` indexed by time.
pub type TrajectoryTable = ProbabilityTable<f64>;

/// A fixed point reported by the simulator.
#[derive(Clone, PartialEq)]
pub struct FixedPoint {
    id: usize,
    probability: f64,
    state: String,
    // Indices (into `FixedPointTable::nodes`) of nodes active in `state`.
    membership: bitvector::BitVector,
    num_nodes: usize,
}

/// Fixed points of one simulation, ordered by their id, together with the node names
/// used for their membership vectors.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedPointTable {
    nodes: Vec<String>,
    fixed_points: Vec<FixedPoint>,
}

/// A source of simulation results.
///
/// Aggregation over ensembles only depends on this trait, so results can come from the
/// disk (`StoredResult`), from memory (`MemoryResult`), or from anything else that can
/// produce a state trajectory.
pub trait ResultSource: Sync {
    /// The dense state probability table over all time points.
    fn states_probtraj(&self) -> Result<TrajectoryTable, MabossError>;

    /// The fixed points of the simulation, with membership vectors over the given `nodes`.
    fn fixed_points(&self, nodes: &[String]) -> Result<FixedPointTable, MabossError>;

    /// A single-row state table with the probabilities at the last time point.
    fn last_states_probtraj(&self) -> Result<TrajectoryTable, MabossError> {
        self.states_probtraj()?
            .last_row()
            .ok_or_else(|| MabossError::MalformedExport("Trajectory has no time points.".to_string()))
    }

    /// The dense node probability table over all time points.
    fn nodes_probtraj(&self) -> Result<TrajectoryTable, MabossError> {
        Ok(self.states_probtraj()?.to_node_table())
    }
}

/// Results exported by the simulator into a directory, using file names
/// `<prefix>_probtraj.csv` and `<prefix>_fp.csv`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoredResult {
    path: PathBuf,
    prefix: String,
}

/// Results which are already available in memory (e.g. produced by an in-process
/// simulator binding).
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryResult {
    rows: Vec<ProbTrajRow>,
    fixed_points: BTreeMap<usize, (f64, String)>,
}
