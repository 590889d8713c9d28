use crate::result::{ProbTrajRow, ProbabilityTable, TrajectoryTable, PROBABILITY_TOLERANCE};
use crate::state_label::{canonicalize, check_label};
use crate::MabossError;
use std::collections::BTreeSet;

/// Build a dense state probability table from sparse trajectory rows.
///
/// The columns are the canonical labels of all states visited at any time point, sorted
/// lexicographically. States which were not visited at a time point have probability zero.
/// Labels which only differ in the order of their nodes share a column (and their
/// probabilities are summed if they appear at the same time point).
///
/// Fails with `MalformedExport` when a label is not well-formed, a probability is negative
/// or not finite, a row sums to more than one (beyond `PROBABILITY_TOLERANCE`), or the time
/// points are not strictly increasing.
pub fn build_state_table(rows: &[ProbTrajRow]) -> Result<TrajectoryTable, MabossError> {
    check_rows(rows)?;
    let canonical_rows = rows
        .iter()
        .map(|row| {
            row.states
                .iter()
                .map(|(label, p)| (canonicalize(label), *p))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let columns = canonical_rows
        .iter()
        .flatten()
        .map(|(label, _)| label.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    let times = rows.iter().map(|row| row.time).collect::<Vec<_>>();
    let mut table = ProbabilityTable::zeros(times, columns);
    for (r, states) in canonical_rows.iter().enumerate() {
        for (label, probability) in states {
            // Every canonical label is a column by construction.
            if let Some(column) = table.column_position(label) {
                table.add(r, column, *probability);
            }
        }
    }
    Ok(table)
}

/// Build a dense node probability table from sparse trajectory rows.
///
/// The columns are the names of all nodes which appear in any visited state (the `<nil>`
/// state has no nodes). The value of a node at a time point is the sum of probabilities of
/// all states visited at that time point in which the node is active.
pub fn build_node_table(rows: &[ProbTrajRow]) -> Result<TrajectoryTable, MabossError> {
    Ok(build_state_table(rows)?.to_node_table())
}

/// **(internal)** Check the structure of the sparse rows.
fn check_rows(rows: &[ProbTrajRow]) -> Result<(), MabossError> {
    for pair in rows.windows(2) {
        if pair[1].time <= pair[0].time {
            return Err(MabossError::MalformedExport(format!(
                "Time points are not increasing ({} followed by {}).",
                pair[0].time, pair[1].time
            )));
        }
    }
    for row in rows {
        if !row.time.is_finite() {
            return Err(MabossError::MalformedExport(format!(
                "Invalid time point {}.",
                row.time
            )));
        }
        for (label, probability) in &row.states {
            check_label(label)?;
            if !probability.is_finite() || *probability < 0.0 {
                return Err(MabossError::MalformedExport(format!(
                    "Invalid probability {} of `{}` at time {}.",
                    probability, label, row.time
                )));
            }
        }
        let sum = row.probability_sum();
        if sum > 1.0 + PROBABILITY_TOLERANCE {
            return Err(MabossError::MalformedExport(format!(
                "Probabilities at time {} sum to {}.",
                row.time, sum
            )));
        }
    }
    Ok(())
}
