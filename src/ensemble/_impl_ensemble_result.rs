use crate::ensemble::{DistributionTable, EnsembleResult, Predicate, DEFAULT_THREAD_COUNT};
use crate::result::{node_index, project_row, ProbabilityTable, ResultSource, StoredResult};
use crate::state_label::canonicalize;
use crate::MabossError;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;

impl EnsembleResult {
    /// Create an ensemble of the given member results. The position of a model in `models`
    /// is its row index in all aggregated tables.
    pub fn new(models: Vec<Box<dyn ResultSource>>) -> EnsembleResult {
        EnsembleResult {
            models,
            model_files: Vec::new(),
            thread_count: DEFAULT_THREAD_COUNT,
            distribution: None,
            nodes_distribution: None,
        }
    }

    /// An ensemble of `count` results exported by the simulator into `path`, where the
    /// results of model `i` use the prefix `<prefix>_model_<i>`.
    pub fn from_directory<P: AsRef<Path>>(path: P, prefix: &str, count: usize) -> EnsembleResult {
        let models = (0..count)
            .map(|i| {
                let model = StoredResult::new(path.as_ref(), &format!("{prefix}_model_{i}"));
                Box::new(model) as Box<dyn ResultSource>
            })
            .collect();
        Self::new(models)
    }

    /// Set the number of worker threads used for aggregation (at least one).
    pub fn with_thread_count(mut self, thread_count: usize) -> EnsembleResult {
        self.thread_count = thread_count.max(1);
        self
    }

    /// Attach the description files of the models (e.g. their `.bnd` files), one per
    /// model in the order of the ensemble. These are the files copied by
    /// `create_sub_ensemble`.
    pub fn with_model_files(mut self, files: Vec<PathBuf>) -> Result<EnsembleResult, MabossError> {
        if files.len() != self.models.len() {
            return Err(MabossError::InvalidParameter(format!(
                "Expected {} model files, but found {}.",
                self.models.len(),
                files.len()
            )));
        }
        self.model_files = files;
        Ok(self)
    }

    pub fn get_model_files(&self) -> &[PathBuf] {
        &self.model_files
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn num_models(&self) -> usize {
        self.models.len()
    }

    /// Result of the model at the given position.
    pub fn get_model(&self, model: usize) -> Option<&dyn ResultSource> {
        self.models.get(model).map(|it| it.as_ref())
    }

    /// Probabilities of compound states at the last time point of every model.
    ///
    /// Rows are models (in the order of the ensemble), columns are the canonical labels of
    /// all states reported by any model. States not reported by a model have probability
    /// zero in its row.
    ///
    /// If the results of some model cannot be extracted, the whole computation fails with
    /// `ExtractionFailure` identifying that model (when several models fail, any one of
    /// them can be reported). The table is computed once and then cached.
    pub fn steady_states_distribution(&mut self) -> Result<&DistributionTable, MabossError> {
        let table = match self.distribution.take() {
            Some(table) => table,
            None => self.compute_distribution()?,
        };
        Ok(self.distribution.insert(table))
    }

    /// Probabilities of nodes at the last time point of every model.
    ///
    /// Rows are the same as in `steady_states_distribution`, columns are all nodes which
    /// appear in some state of that table. The table is computed once and then cached.
    pub fn steady_states_nodes_distribution(&mut self) -> Result<&DistributionTable, MabossError> {
        let table = match self.nodes_distribution.take() {
            Some(table) => table,
            None => {
                let thread_count = self.thread_count;
                let states = self.steady_states_distribution()?;
                let pool = worker_pool(thread_count)?;
                let nodes = states.node_columns();
                let index = node_index(&nodes);
                let values = pool.install(|| {
                    (0..states.num_rows())
                        .into_par_iter()
                        .map(|row| project_row(states.columns(), &index, states.row(row)))
                        .collect::<Vec<_>>()
                });
                ProbabilityTable::from_values(states.index().to_vec(), nodes, values)
            }
        };
        Ok(self.nodes_distribution.insert(table))
    }

    /// Indices of models whose steady state distribution satisfies the `predicate`
    /// (e.g. `"A -- B > 0.5"`).
    ///
    /// The predicate is parsed before any results are extracted.
    pub fn filter_states(&mut self, predicate: &str) -> Result<BTreeSet<usize>, MabossError> {
        let predicate = Predicate::from_str(predicate)?;
        predicate.select(self.steady_states_distribution()?)
    }

    /// Indices of models whose steady state node distribution satisfies the `predicate`
    /// (e.g. `"p53 >= 0.2"`).
    ///
    /// The predicate is parsed before any results are extracted.
    pub fn filter_nodes(&mut self, predicate: &str) -> Result<BTreeSet<usize>, MabossError> {
        let predicate = Predicate::from_str(predicate)?;
        predicate.select(self.steady_states_nodes_distribution()?)
    }

    /// Indices of models which satisfy both given predicates: `node_filter` is evaluated
    /// on the node distribution and `state_filter` on the state distribution. At least
    /// one of them must be given.
    pub fn filter_ensemble(
        &mut self,
        node_filter: Option<&str>,
        state_filter: Option<&str>,
    ) -> Result<BTreeSet<usize>, MabossError> {
        let node_filter = node_filter.map(Predicate::from_str).transpose()?;
        let state_filter = state_filter.map(Predicate::from_str).transpose()?;
        let selected = match (node_filter, state_filter) {
            (None, None) => {
                return Err(MabossError::InvalidPredicate(
                    "No node or state filter given.".to_string(),
                ))
            }
            (Some(nodes), None) => nodes.select(self.steady_states_nodes_distribution()?)?,
            (None, Some(states)) => states.select(self.steady_states_distribution()?)?,
            (Some(nodes), Some(states)) => {
                let by_nodes = nodes.select(self.steady_states_nodes_distribution()?)?;
                let by_states = states.select(self.steady_states_distribution()?)?;
                by_nodes.intersection(&by_states).copied().collect()
            }
        };
        Ok(selected)
    }

    /// Copy the model files of all models selected by `filter_ensemble` into the `output`
    /// directory (created if it does not exist), keeping their file names. Returns the
    /// indices of the copied models.
    ///
    /// Fails with `InvalidParameter` if the ensemble has no model files.
    pub fn create_sub_ensemble(
        &mut self,
        output: &Path,
        node_filter: Option<&str>,
        state_filter: Option<&str>,
    ) -> Result<BTreeSet<usize>, MabossError> {
        if self.model_files.is_empty() && !self.models.is_empty() {
            return Err(MabossError::InvalidParameter(
                "The ensemble has no model files.".to_string(),
            ));
        }
        let selected = self.filter_ensemble(node_filter, state_filter)?;
        std::fs::create_dir_all(output)?;
        for model in &selected {
            let source = &self.model_files[*model];
            let name = source.file_name().ok_or_else(|| {
                MabossError::InvalidParameter(format!(
                    "Model file `{}` has no file name.",
                    source.display()
                ))
            })?;
            std::fs::copy(source, output.join(name))?;
        }
        tracing::info!(
            models = selected.len(),
            output = %output.display(),
            "Sub-ensemble created."
        );
        Ok(selected)
    }

    /// **(internal)** Extract the last state row of every model in parallel and merge
    /// them into one table.
    fn compute_distribution(&self) -> Result<DistributionTable, MabossError> {
        let pool = worker_pool(self.thread_count)?;
        tracing::info!(
            models = self.models.len(),
            threads = self.thread_count,
            "Extracting steady states of ensemble."
        );
        let mut rows = pool.install(|| {
            self.models
                .par_iter()
                .enumerate()
                .map(|(i, model)| {
                    steady_state_row(model.as_ref())
                        .map(|row| (i, row))
                        .map_err(|e| e.in_model(i))
                })
                .collect::<Result<Vec<_>, _>>()
        })?;
        rows.sort_by_key(|(i, _)| *i);

        let columns = rows
            .iter()
            .flat_map(|(_, row)| row.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let index = rows.iter().map(|(i, _)| *i).collect::<Vec<_>>();
        let mut table = ProbabilityTable::zeros(index, columns);
        for (position, (_, row)) in rows.iter().enumerate() {
            for (label, probability) in row {
                if let Some(column) = table.column_position(label) {
                    table.add(position, column, *probability);
                }
            }
        }
        tracing::debug!(
            models = table.num_rows(),
            states = table.num_columns(),
            "Steady state distribution ready."
        );
        Ok(table)
    }
}

/// **(internal)** Create the bounded pool used for aggregation.
fn worker_pool(threads: usize) -> Result<ThreadPool, MabossError> {
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| MabossError::WorkerPool(e.to_string()))
}

/// **(internal)** Last state probabilities of one model, keyed by canonical labels.
///
/// Columns which collapse to the same canonical label are summed.
fn steady_state_row(model: &dyn ResultSource) -> Result<BTreeMap<String, f64>, MabossError> {
    let last = model.last_states_probtraj()?;
    let mut row = BTreeMap::new();
    for (label, probability) in last.columns().iter().zip(last.row(0)) {
        *row.entry(canonicalize(label)).or_insert(0.0) += *probability;
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use crate::ensemble::EnsembleResult;
    use crate::result::{
        FixedPointTable, MemoryResult, ProbTrajRow, ProbabilityTable, ResultSource,
        TrajectoryTable,
    };
    use crate::MabossError;
    use pretty_assertions::assert_eq;
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn model(states: &[(&str, f64)]) -> Box<dyn ResultSource> {
        let rows = vec![
            ProbTrajRow::new(0.0, vec![("<nil>".to_string(), 1.0)]),
            ProbTrajRow::new(
                1.0,
                states.iter().map(|(s, p)| (s.to_string(), *p)).collect(),
            ),
        ];
        Box::new(MemoryResult::from_rows(rows))
    }

    fn models() -> Vec<Box<dyn ResultSource>> {
        vec![
            model(&[("A", 0.75), ("<nil>", 0.25)]),
            model(&[("A", 0.25), ("B", 0.75)]),
            model(&[("B -- A", 0.5), ("A", 0.125), ("<nil>", 0.375)]),
        ]
    }

    /// A result which counts how many times it was asked for its trajectory.
    struct CountingResult {
        calls: Arc<AtomicUsize>,
        table: TrajectoryTable,
    }

    impl ResultSource for CountingResult {
        fn states_probtraj(&self) -> Result<TrajectoryTable, MabossError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.table.clone())
        }

        fn fixed_points(&self, nodes: &[String]) -> Result<FixedPointTable, MabossError> {
            FixedPointTable::build(&BTreeMap::new(), nodes)
        }
    }

    #[test]
    fn steady_states_distribution_basic() {
        let mut ensemble = EnsembleResult::new(models()).with_thread_count(2);
        assert_eq!(3, ensemble.num_models());
        let table = ensemble.steady_states_distribution().unwrap();
        assert_eq!(vec![0, 1, 2], table.index());
        // `<nil>` from time 0.0 is kept with probability zero in the second model.
        assert_eq!(vec!["<nil>", "A", "A -- B", "B"], table.columns());
        assert_eq!(vec![0.25, 0.75, 0.0, 0.0], table.row(0));
        assert_eq!(vec![0.0, 0.25, 0.0, 0.75], table.row(1));
        assert_eq!(vec![0.375, 0.125, 0.5, 0.0], table.row(2));

        let nodes = ensemble.steady_states_nodes_distribution().unwrap();
        assert_eq!(vec!["A", "B"], nodes.columns());
        assert_eq!(vec![0.75, 0.0], nodes.row(0));
        assert_eq!(vec![0.25, 0.75], nodes.row(1));
        assert_eq!(vec![0.625, 0.5], nodes.row(2));
    }

    #[test]
    fn filter_models() {
        let mut ensemble = EnsembleResult::new(vec![
            model(&[("A", 0.9), ("<nil>", 0.1)]),
            model(&[("A", 0.2), ("B", 0.8)]),
            model(&[("A -- B", 0.6), ("<nil>", 0.4)]),
        ]);
        assert_eq!(BTreeSet::from([0, 2]), ensemble.filter_nodes("A > 0.5").unwrap());
        assert_eq!(BTreeSet::from([2]), ensemble.filter_states("B -- A >= 0.6").unwrap());
        assert_eq!(
            BTreeSet::from([0, 1, 2]),
            ensemble.filter_states("<nil> < 0.5").unwrap()
        );
        assert!(matches!(
            ensemble.filter_nodes("C > 0.5"),
            Err(MabossError::InvalidPredicate(_))
        ));
    }

    #[test]
    fn failing_model_is_reported() {
        let mut models = models();
        models.insert(1, model(&[("A", 0.75), ("B", 0.75)]));
        let mut ensemble = EnsembleResult::new(models);
        match ensemble.steady_states_distribution() {
            Err(MabossError::ExtractionFailure { model, cause }) => {
                assert_eq!(1, model);
                assert!(matches!(*cause, MabossError::MalformedExport(_)));
            }
            other => panic!("Unexpected result {:?}", other),
        }
    }

    #[test]
    fn distribution_does_not_depend_on_scheduling() {
        let mut forward = EnsembleResult::new(models()).with_thread_count(3);
        let mut reversed_models = models();
        reversed_models.reverse();
        let mut reversed = EnsembleResult::new(reversed_models).with_thread_count(1);
        let forward = forward.steady_states_distribution().unwrap();
        let reversed = reversed.steady_states_distribution().unwrap();
        assert_eq!(forward.columns(), reversed.columns());
        for i in 0..3 {
            assert_eq!(forward.row(i), reversed.row(2 - i));
        }
    }

    #[test]
    fn duplicate_labels_are_summed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let table = ProbabilityTable::from_values(
            vec![0.0],
            vec!["A -- B".to_string(), "B -- A".to_string()],
            vec![vec![0.25, 0.5]],
        );
        let source: Box<dyn ResultSource> = Box::new(CountingResult { calls, table });
        let mut ensemble = EnsembleResult::new(vec![source]);
        let distribution = ensemble.steady_states_distribution().unwrap();
        assert_eq!(vec!["A -- B"], distribution.columns());
        assert_eq!(vec![0.75], distribution.row(0));
    }

    #[test]
    fn distributions_are_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let table = ProbabilityTable::from_values(
            vec![0.0, 1.0],
            vec!["A".to_string()],
            vec![vec![0.0], vec![1.0]],
        );
        let source = |calls: &Arc<AtomicUsize>| -> Box<dyn ResultSource> {
            Box::new(CountingResult {
                calls: calls.clone(),
                table: table.clone(),
            })
        };
        let mut ensemble = EnsembleResult::new(vec![source(&calls), source(&calls)]);

        // Malformed predicates are rejected before anything is extracted.
        assert!(matches!(
            ensemble.filter_states("A >"),
            Err(MabossError::InvalidPredicate(_))
        ));
        assert_eq!(0, calls.load(Ordering::SeqCst));

        ensemble.steady_states_distribution().unwrap();
        ensemble.steady_states_nodes_distribution().unwrap();
        ensemble.filter_states("A > 0.5").unwrap();
        ensemble.filter_nodes("A > 0.5").unwrap();
        assert_eq!(2, calls.load(Ordering::SeqCst));
    }

    #[test]
    fn nodes_distribution_extracts_states_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let table = ProbabilityTable::from_values(
            vec![0.0],
            vec!["A -- B".to_string(), "<nil>".to_string()],
            vec![vec![0.25, 0.75]],
        );
        let source: Box<dyn ResultSource> = Box::new(CountingResult {
            calls: calls.clone(),
            table,
        });
        let mut ensemble = EnsembleResult::new(vec![source]).with_thread_count(1);
        let nodes = ensemble.steady_states_nodes_distribution().unwrap();
        assert_eq!(vec!["A", "B"], nodes.columns());
        assert_eq!(vec![0.25, 0.25], nodes.row(0));
        assert_eq!(1, calls.load(Ordering::SeqCst));
        let states = ensemble.steady_states_distribution().unwrap();
        assert_eq!(vec![0.75, 0.25], states.row(0));
        assert_eq!(1, calls.load(Ordering::SeqCst));
    }

    #[test]
    fn filter_with_node_and_state_predicates() {
        let mut ensemble = EnsembleResult::new(models());
        assert_eq!(
            BTreeSet::from([0, 2]),
            ensemble.filter_ensemble(Some("A > 0.5"), None).unwrap()
        );
        assert_eq!(
            BTreeSet::from([0, 2]),
            ensemble.filter_ensemble(None, Some("<nil> > 0.2")).unwrap()
        );
        assert_eq!(
            BTreeSet::from([2]),
            ensemble.filter_ensemble(Some("A > 0.5"), Some("B -- A > 0")).unwrap()
        );
        assert!(matches!(
            ensemble.filter_ensemble(None, None),
            Err(MabossError::InvalidPredicate(_))
        ));
    }

    #[test]
    fn sub_ensemble_copies_selected_models() {
        let input = tempfile::tempdir().unwrap();
        let files = (0..3)
            .map(|i| {
                let file = input.path().join(format!("model_{i}.bnd"));
                std::fs::write(&file, format!("Node N{i} {{ logic = N{i}; }}\n")).unwrap();
                file
            })
            .collect::<Vec<_>>();
        let mut ensemble = EnsembleResult::new(models())
            .with_model_files(files)
            .unwrap();
        let output = input.path().join("selected");
        let selected = ensemble
            .create_sub_ensemble(&output, Some("A > 0.5"), None)
            .unwrap();
        assert_eq!(BTreeSet::from([0, 2]), selected);
        let mut copied = std::fs::read_dir(&output)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        copied.sort();
        assert_eq!(vec!["model_0.bnd", "model_2.bnd"], copied);
        assert_eq!(
            "Node N2 { logic = N2; }\n",
            std::fs::read_to_string(output.join("model_2.bnd")).unwrap()
        );

        // An existing output directory is reused.
        let selected = ensemble
            .create_sub_ensemble(&output, None, Some("B > 0.5"))
            .unwrap();
        assert_eq!(BTreeSet::from([1]), selected);
        assert!(output.join("model_1.bnd").exists());
    }

    #[test]
    fn sub_ensemble_requires_model_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            EnsembleResult::new(models()).with_model_files(Vec::new()),
            Err(MabossError::InvalidParameter(_))
        ));
        let mut ensemble = EnsembleResult::new(models());
        assert!(matches!(
            ensemble.create_sub_ensemble(dir.path(), Some("A > 0.5"), None),
            Err(MabossError::InvalidParameter(_))
        ));
    }

    #[test]
    fn ensemble_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let exports = [
            "Time\tState\tProba\n0\t<nil>\t1\n1\tA\t1\n",
            "Time\tState\tProba\tState\tProba\n0\t<nil>\t1\n1\tB\t0.5\t<nil>\t0.5\n",
        ];
        for (i, export) in exports.iter().enumerate() {
            let file = dir.path().join(format!("res_model_{i}_probtraj.csv"));
            std::fs::write(file, export).unwrap();
        }
        let mut ensemble = EnsembleResult::from_directory(dir.path(), "res", 2);
        let nodes = ensemble.steady_states_nodes_distribution().unwrap();
        assert_eq!(vec!["A", "B"], nodes.columns());
        assert_eq!(vec![1.0, 0.0], nodes.row(0));
        assert_eq!(vec![0.0, 0.5], nodes.row(1));

        let mut missing = EnsembleResult::from_directory(dir.path(), "res", 3);
        assert!(matches!(
            missing.steady_states_distribution(),
            Err(MabossError::ExtractionFailure { model: 2, .. })
        ));
    }
}
