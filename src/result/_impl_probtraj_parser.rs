use crate::result::ProbTrajRow;
use crate::MabossError;
use regex::Regex;

lazy_static! {
    /// Matches a state column of the trajectory export (`State`, optionally numbered).
    static ref STATE_COLUMN: Regex = Regex::new(r"^State(\.?\d+)?$").unwrap();

    /// Matches a probability column of the trajectory export (`Proba`, optionally numbered).
    static ref PROBA_COLUMN: Regex = Regex::new(r"^Proba(\.?\d+)?$").unwrap();
}

impl ProbTrajRow {
    /// Create a new row with the given time and visited states.
    pub fn new(time: f64, states: Vec<(String, f64)>) -> ProbTrajRow {
        ProbTrajRow { time, states }
    }

    pub fn get_time(&self) -> f64 {
        self.time
    }

    /// Visited states and their probabilities, in the order of the export.
    pub fn get_states(&self) -> &[(String, f64)] {
        &self.states
    }

    /// Total probability of all visited states.
    pub fn probability_sum(&self) -> f64 {
        self.states.iter().map(|(_, p)| *p).sum()
    }
}

/// Parse the sparse trajectory export (`<prefix>_probtraj.csv`) of the simulator.
///
/// The export is a tab-separated table with a `Time` column and a repeated group of
/// `State`, `Proba` (and usually `ErrorProba`) columns, one group per visited state. Rows
/// which visit fewer states leave the remaining groups empty (or omit them entirely).
/// Other columns (entropy statistics, etc.) are ignored.
pub fn parse_probtraj(text: &str) -> Result<Vec<ProbTrajRow>, MabossError> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| MabossError::MalformedExport("Trajectory export is empty.".to_string()))?;
    let header = header.split('\t').map(|it| it.trim()).collect::<Vec<_>>();
    let time_column = header.iter().position(|it| *it == "Time").ok_or_else(|| {
        MabossError::MalformedExport("Trajectory export has no `Time` column.".to_string())
    })?;
    let pairs = state_columns(&header)?;

    let mut rows = Vec::new();
    for (line_number, line) in lines.enumerate() {
        // Line numbers in messages are 1-based and include the header.
        let line_number = line_number + 2;
        let fields = line.split('\t').map(|it| it.trim()).collect::<Vec<_>>();
        let time = fields
            .get(time_column)
            .and_then(|it| it.parse::<f64>().ok())
            .ok_or_else(|| {
                MabossError::MalformedExport(format!("Line {line_number}: invalid time point."))
            })?;
        let mut states = Vec::new();
        for (state_column, proba_column) in &pairs {
            let state = fields.get(*state_column).filter(|it| !it.is_empty());
            let proba = fields.get(*proba_column).filter(|it| !it.is_empty());
            match (state, proba) {
                (None, None) => {}
                (Some(state), Some(proba)) => {
                    let proba = proba.parse::<f64>().map_err(|_| {
                        MabossError::MalformedExport(format!(
                            "Line {line_number}: invalid probability `{proba}` of `{state}`."
                        ))
                    })?;
                    states.push((state.to_string(), proba));
                }
                (Some(state), None) => {
                    return Err(MabossError::MalformedExport(format!(
                        "Line {line_number}: state `{state}` has no probability."
                    )));
                }
                (None, Some(proba)) => {
                    return Err(MabossError::MalformedExport(format!(
                        "Line {line_number}: probability `{proba}` has no state."
                    )));
                }
            }
        }
        rows.push(ProbTrajRow::new(time, states));
    }
    tracing::debug!(rows = rows.len(), groups = pairs.len(), "Parsed trajectory export.");
    Ok(rows)
}

/// **(internal)** Pair every `State` column of the header with the first `Proba` column
/// which follows it.
fn state_columns(header: &[&str]) -> Result<Vec<(usize, usize)>, MabossError> {
    let mut pairs = Vec::new();
    let mut open_state: Option<usize> = None;
    for (i, column) in header.iter().enumerate() {
        if STATE_COLUMN.is_match(column) {
            if let Some(state) = open_state {
                return Err(MabossError::MalformedExport(format!(
                    "State column {state} has no probability column."
                )));
            }
            open_state = Some(i);
        } else if PROBA_COLUMN.is_match(column) {
            let Some(state) = open_state.take() else {
                return Err(MabossError::MalformedExport(format!(
                    "Probability column {i} has no state column."
                )));
            };
            pairs.push((state, i));
        }
    }
    if let Some(state) = open_state {
        return Err(MabossError::MalformedExport(format!(
            "State column {state} has no probability column."
        )));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use crate::result::{parse_probtraj, ProbTrajRow};
    use crate::MabossError;
    use pretty_assertions::assert_eq;

    const PROBTRAJ: &str = "Time\tTH\tErrorTH\tH\tHD=0\tState\tProba\tErrorProba\tState\tProba\tErrorProba\n\
        0\t0.1\t0\t1\t0\tA -- B\t0.6\t0.01\t<nil>\t0.4\t0.01\n\
        0.5\t0.2\t0\t0\t0\tB -- A\t1\t0\n\
        1\t0.3\t0\t1\t0\tA\t0.3\t0.01\t<nil>\t0.7\t0.01\n";

    #[test]
    fn parse_probtraj_basic() {
        let rows = parse_probtraj(PROBTRAJ).unwrap();
        let expected = vec![
            ProbTrajRow::new(
                0.0,
                vec![("A -- B".to_string(), 0.6), ("<nil>".to_string(), 0.4)],
            ),
            ProbTrajRow::new(0.5, vec![("B -- A".to_string(), 1.0)]),
            ProbTrajRow::new(
                1.0,
                vec![("A".to_string(), 0.3), ("<nil>".to_string(), 0.7)],
            ),
        ];
        assert_eq!(expected, rows);
        assert_eq!(1.0, rows[0].probability_sum());
    }

    #[test]
    fn parse_probtraj_empty_trailing_groups() {
        let text = "Time\tState\tProba\tState\tProba\n0\tA\t0.5\t\t\n1\tA\t1\n";
        let rows = parse_probtraj(text).unwrap();
        assert_eq!(1, rows[0].get_states().len());
        assert_eq!(1, rows[1].get_states().len());
        assert_eq!(1.0, rows[1].get_time());
    }

    #[test]
    fn parse_probtraj_malformed() {
        let inputs = vec![
            "",
            "State\tProba\nA\t1\n",
            "Time\tState\tProba\nx\tA\t1\n",
            "Time\tState\tProba\n0\tA\t\n",
            "Time\tState\tProba\n0\t\t0.5\n",
            "Time\tState\tProba\n0\tA\tabc\n",
            "Time\tState\tState\tProba\n0\tA\tB\t1\n",
            "Time\tProba\tState\n0\t1\tA\n",
        ];
        for input in inputs {
            assert!(
                matches!(parse_probtraj(input), Err(MabossError::MalformedExport(_))),
                "Accepted `{}`",
                input
            );
        }
    }
}
