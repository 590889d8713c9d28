use crate::result::ProbabilityTable;
use crate::state_label::{label_nodes, NIL_STATE};
use fxhash::FxHashMap;
use std::collections::BTreeSet;
use std::fmt::{Display, Error, Formatter};

/// Methods for constructing `ProbabilityTable`s.
impl<R> ProbabilityTable<R> {
    /// Create a table of zeros with the given row index and (sorted, unique) columns.
    pub(crate) fn zeros(index: Vec<R>, columns: Vec<String>) -> ProbabilityTable<R> {
        let values = vec![vec![0.0; columns.len()]; index.len()];
        Self::from_values(index, columns, values)
    }

    /// Create a table from explicit row values. Every row must have one value per column.
    pub(crate) fn from_values(
        index: Vec<R>,
        columns: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> ProbabilityTable<R> {
        debug_assert_eq!(index.len(), values.len());
        debug_assert!(values.iter().all(|row| row.len() == columns.len()));
        let column_index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect::<FxHashMap<_, _>>();
        ProbabilityTable {
            index,
            columns,
            column_index,
            values,
        }
    }

    /// **(internal)** Add `probability` to the cell at `row` and `column`.
    pub(crate) fn add(&mut self, row: usize, column: usize, probability: f64) {
        self.values[row][column] += probability;
    }
}

/// Some basic utility methods for inspecting the `ProbabilityTable`.
impl<R> ProbabilityTable<R> {
    pub fn num_rows(&self) -> usize {
        self.index.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Row labels of this table (time points or model ids).
    pub fn index(&self) -> &[R] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of the column with the given name.
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).cloned()
    }

    /// Values of the row at the given position.
    pub fn row(&self, position: usize) -> &[f64] {
        &self.values[position]
    }

    /// Values of the column with the given name, or `None` if the column does not exist.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let column = self.column_position(name)?;
        Some(self.values.iter().map(|row| row[column]).collect())
    }

    /// Value at the row position and column name, or `None` if the column does not exist.
    pub fn get(&self, position: usize, column: &str) -> Option<f64> {
        let column = self.column_position(column)?;
        self.values.get(position).map(|row| row[column])
    }

    /// Sum of all values in the row at the given position.
    pub fn row_sum(&self, position: usize) -> f64 {
        self.values[position].iter().sum()
    }
}

/// Derived tables.
impl<R: Clone> ProbabilityTable<R> {
    /// A single-row table with the last row of this table, or `None` for an empty table.
    pub fn last_row(&self) -> Option<ProbabilityTable<R>> {
        let last = self.index.len().checked_sub(1)?;
        Some(ProbabilityTable {
            index: vec![self.index[last].clone()],
            columns: self.columns.clone(),
            column_index: self.column_index.clone(),
            values: vec![self.values[last].clone()],
        })
    }

    /// Keep only the columns whose maximal value is strictly above the `threshold`.
    pub fn with_cutoff(&self, threshold: f64) -> ProbabilityTable<R> {
        let kept = (0..self.columns.len())
            .filter(|c| self.values.iter().any(|row| row[*c] > threshold))
            .collect::<Vec<_>>();
        let columns = kept.iter().map(|c| self.columns[*c].clone()).collect();
        let values = self
            .values
            .iter()
            .map(|row| kept.iter().map(|c| row[*c]).collect())
            .collect();
        Self::from_values(self.index.clone(), columns, values)
    }

    /// Derive a node table from this state table: one column per node appearing in any
    /// state label, with the sum of probabilities of all states where the node is active.
    pub fn to_node_table(&self) -> ProbabilityTable<R> {
        let nodes = self.node_columns();
        let node_index = node_index(&nodes);
        let values = self
            .values
            .iter()
            .map(|row| project_row(&self.columns, &node_index, row))
            .collect();
        Self::from_values(self.index.clone(), nodes, values)
    }

    /// Sorted names of all nodes which appear in the state labels of this table.
    ///
    /// The `NIL_STATE` never contributes a node.
    pub fn node_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|it| it.as_str() != NIL_STATE)
            .flat_map(|it| label_nodes(it))
            .map(|it| it.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// **(internal)** Map node names to their column positions.
pub(crate) fn node_index(nodes: &[String]) -> FxHashMap<&str, usize> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect()
}

/// **(internal)** Project one row of state probabilities (with the given state `columns`)
/// onto nodes. Probabilities are accumulated, since a node is usually active in several
/// states at once.
pub(crate) fn project_row(
    columns: &[String],
    node_index: &FxHashMap<&str, usize>,
    row: &[f64],
) -> Vec<f64> {
    let mut result = vec![0.0; node_index.len()];
    for (label, probability) in columns.iter().zip(row) {
        for node in label_nodes(label) {
            if let Some(position) = node_index.get(node) {
                result[*position] += *probability;
            }
        }
    }
    result
}

/// Tab-separated output with a header row of column names.
impl<R: Display> Display for ProbabilityTable<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        for column in &self.columns {
            write!(f, "\t{column}")?;
        }
        writeln!(f)?;
        for (label, row) in self.index.iter().zip(&self.values) {
            write!(f, "{label}")?;
            for value in row {
                write!(f, "\t{value}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
