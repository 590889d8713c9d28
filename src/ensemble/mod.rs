//! Aggregation of results of many independently simulated models.
//!
//! An `EnsembleResult` collects the *last* state probabilities of every member model into
//! a single `DistributionTable` (one row per model, one column per compound state visited
//! by any model). Rows can be also projected onto nodes, and both tables can be filtered
//! using simple threshold predicates such as `"p53 > 0.5"` or `"A -- B <= 0.1"`.
//!
//! Extraction of per-model results runs in parallel on a bounded `rayon` pool. The
//! tables are computed at most once per ensemble and cached afterwards.
//!
//! ```rust
//! use biodivine_lib_maboss::ensemble::EnsembleResult;
//! use biodivine_lib_maboss::result::{MemoryResult, ProbTrajRow, ResultSource};
//!
//! let model = |label: &str, p: f64| -> Box<dyn ResultSource> {
//!     let row = ProbTrajRow::new(1.0, vec![(label.to_string(), p), ("<nil>".to_string(), 1.0 - p)]);
//!     Box::new(MemoryResult::from_rows(vec![row]))
//! };
//! let mut ensemble = EnsembleResult::new(vec![model("A", 0.75), model("B -- A", 0.25)]);
//! let selected = ensemble.filter_nodes("A > 0.5").unwrap();
//! assert_eq!(vec![0], selected.into_iter().collect::<Vec<_>>());
//! ```

use crate::result::{ProbabilityTable, ResultSource};
use std::path::PathBuf;

/// **(internal)** Parallel extraction and caching of ensemble distributions.
mod _impl_ensemble_result;
/// **(internal)** Parsing and evaluation of filter predicates.
mod _impl_predicate;

/// Number of worker threads used for aggregation unless configured otherwise.
pub const DEFAULT_THREAD_COUNT: usize = 6;

/// A `ProbabilityTable` indexed by the position of a model in the ensemble.
pub type DistributionTable = ProbabilityTable<usize>;

/// Results of an ensemble of models, together with cached aggregated tables.
pub struct EnsembleResult {
    models: Vec<Box<dyn ResultSource>>,
    // Model description files, either empty or one per model.
    model_files: Vec<PathBuf>,
    thread_count: usize,
    distribution: Option<DistributionTable>,
    nodes_distribution: Option<DistributionTable>,
}

/// Comparison operator of a filter `Predicate`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ComparisonOp {
    Lt,
    Gt,
    Eq,
    Neq,
    Le,
    Ge,
}

/// A filter predicate of the form `<column> <op> <number>`.
///
/// The column is either a node name or a compound state label (stored in canonical form).
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    column: String,
    op: ComparisonOp,
    value: f64,
}
