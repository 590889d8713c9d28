use crate::result::{
    build_state_table, parse_fixed_points, parse_probtraj, FixedPointTable, MemoryResult,
    ProbTrajRow, ResultSource, StoredResult, TrajectoryTable,
};
use crate::MabossError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

impl StoredResult {
    /// Results stored in directory `path` with exports named `<prefix>_probtraj.csv`
    /// and `<prefix>_fp.csv`. Nothing is read until the results are requested.
    pub fn new<P: AsRef<Path>>(path: P, prefix: &str) -> StoredResult {
        StoredResult {
            path: path.as_ref().to_path_buf(),
            prefix: prefix.to_string(),
        }
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    pub fn get_prefix(&self) -> &str {
        &self.prefix
    }

    /// Path of the sparse trajectory export.
    pub fn probtraj_file(&self) -> PathBuf {
        self.path.join(format!("{}_probtraj.csv", self.prefix))
    }

    /// Path of the fixed point export.
    pub fn fp_file(&self) -> PathBuf {
        self.path.join(format!("{}_fp.csv", self.prefix))
    }

    /// Read and parse the sparse trajectory export.
    pub fn read_probtraj(&self) -> Result<Vec<ProbTrajRow>, MabossError> {
        let file = self.probtraj_file();
        tracing::debug!(file = %file.display(), "Reading trajectory export.");
        parse_probtraj(&std::fs::read_to_string(file)?)
    }

    /// Read and parse the fixed point export.
    pub fn read_fixed_points(&self) -> Result<BTreeMap<usize, (f64, String)>, MabossError> {
        let file = self.fp_file();
        tracing::debug!(file = %file.display(), "Reading fixed point export.");
        parse_fixed_points(&std::fs::read_to_string(file)?)
    }
}

impl ResultSource for StoredResult {
    fn states_probtraj(&self) -> Result<TrajectoryTable, MabossError> {
        build_state_table(&self.read_probtraj()?)
    }

    fn fixed_points(&self, nodes: &[String]) -> Result<FixedPointTable, MabossError> {
        FixedPointTable::build(&self.read_fixed_points()?, nodes)
    }
}

impl MemoryResult {
    pub fn new(rows: Vec<ProbTrajRow>, fixed_points: BTreeMap<usize, (f64, String)>) -> Self {
        MemoryResult { rows, fixed_points }
    }

    /// A result with a trajectory but no fixed points.
    pub fn from_rows(rows: Vec<ProbTrajRow>) -> Self {
        Self::new(rows, BTreeMap::new())
    }

    pub fn get_rows(&self) -> &[ProbTrajRow] {
        &self.rows
    }
}

impl ResultSource for MemoryResult {
    fn states_probtraj(&self) -> Result<TrajectoryTable, MabossError> {
        build_state_table(&self.rows)
    }

    fn fixed_points(&self, nodes: &[String]) -> Result<FixedPointTable, MabossError> {
        FixedPointTable::build(&self.fixed_points, nodes)
    }
}

#[cfg(test)]
mod tests {
    use crate::result::{MemoryResult, ProbTrajRow, ResultSource, StoredResult};
    use crate::MabossError;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    const PROBTRAJ: &str = "Time\tTH\tState\tProba\tErrorProba\tState\tProba\tErrorProba\n\
        0\t0\tA -- B\t0.6\t0\t<nil>\t0.4\t0\n\
        0.5\t0\tB -- A\t1\t0\n\
        1\t0\tA\t0.3\t0\t<nil>\t0.7\t0\n";

    const FP: &str = "Fixed Points (1)\nFP\tProba\tState\tA\tB\n#0\t0.9\tA\t1\t0\n";

    #[test]
    fn stored_result_reads_exports() {
        let dir = tempfile::tempdir().unwrap();
        let result = StoredResult::new(dir.path(), "res");
        std::fs::write(result.probtraj_file(), PROBTRAJ).unwrap();
        std::fs::write(result.fp_file(), FP).unwrap();
        assert_eq!("res", result.get_prefix());
        assert!(result.probtraj_file().ends_with("res_probtraj.csv"));

        let states = result.states_probtraj().unwrap();
        assert_eq!(vec!["<nil>", "A", "A -- B"], states.columns());
        let last = result.last_states_probtraj().unwrap();
        assert_eq!(vec![1.0], last.index());
        assert_eq!(vec![0.7, 0.3, 0.0], last.row(0));
        let nodes = result.nodes_probtraj().unwrap();
        assert_eq!(vec![1.0, 1.0], nodes.row(1));

        let names = vec!["A".to_string(), "B".to_string()];
        let points = result.fixed_points(&names).unwrap();
        assert_eq!(FP, points.to_string());
    }

    #[test]
    fn stored_result_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let result = StoredResult::new(dir.path(), "missing");
        assert!(matches!(result.states_probtraj(), Err(MabossError::Io(_))));
        assert!(matches!(result.fixed_points(&[]), Err(MabossError::Io(_))));
    }

    #[test]
    fn memory_result_tables() {
        let rows = vec![
            ProbTrajRow::new(0.0, vec![("B -- A".to_string(), 1.0)]),
            ProbTrajRow::new(1.0, vec![("A".to_string(), 0.25)]),
        ];
        let mut points = BTreeMap::new();
        points.insert(3, (0.25, "A".to_string()));
        let result = MemoryResult::new(rows, points);
        assert_eq!(2, result.get_rows().len());
        let last = result.last_states_probtraj().unwrap();
        assert_eq!(Some(0.25), last.get(0, "A"));
        assert_eq!(Some(0.0), last.get(0, "A -- B"));
        let points = result.fixed_points(&["A".to_string()]).unwrap();
        assert_eq!(3, points.fixed_points()[0].get_id());
    }

    #[test]
    fn empty_trajectory_has_no_last_row() {
        let result = MemoryResult::from_rows(Vec::new());
        assert!(matches!(
            result.last_states_probtraj(),
            Err(MabossError::MalformedExport(_))
        ));
    }
}
