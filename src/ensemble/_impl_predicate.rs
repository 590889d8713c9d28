use crate::ensemble::{ComparisonOp, Predicate};
use crate::result::ProbabilityTable;
use crate::state_label::{make_label, NIL_STATE};
use crate::MabossError;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt::{Display, Error, Formatter};
use std::str::FromStr;

lazy_static! {
    /// Matches `<column> <op> <number>`, where the column is a node name, a compound state
    /// label, or `<nil>`.
    static ref PREDICATE_REGEX: Regex = Regex::new(
        r"^\s*(<nil>|[a-zA-Z_][a-zA-Z0-9_]*(?:\s*--\s*[a-zA-Z_][a-zA-Z0-9_]*)*)\s*(<=|>=|==|!=|<|>)\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)\s*$"
    )
    .unwrap();
}

impl ComparisonOp {
    /// Evaluate `left <op> right`.
    pub fn apply(&self, left: f64, right: f64) -> bool {
        match self {
            ComparisonOp::Lt => left < right,
            ComparisonOp::Gt => left > right,
            ComparisonOp::Eq => left == right,
            ComparisonOp::Neq => left != right,
            ComparisonOp::Le => left <= right,
            ComparisonOp::Ge => left >= right,
        }
    }
}

impl FromStr for ComparisonOp {
    type Err = MabossError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "<" => Ok(ComparisonOp::Lt),
            ">" => Ok(ComparisonOp::Gt),
            "==" => Ok(ComparisonOp::Eq),
            "!=" => Ok(ComparisonOp::Neq),
            "<=" => Ok(ComparisonOp::Le),
            ">=" => Ok(ComparisonOp::Ge),
            _ => Err(MabossError::InvalidPredicate(format!(
                "Unknown comparison `{value}`."
            ))),
        }
    }
}

impl Display for ComparisonOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let symbol = match self {
            ComparisonOp::Lt => "<",
            ComparisonOp::Gt => ">",
            ComparisonOp::Eq => "==",
            ComparisonOp::Neq => "!=",
            ComparisonOp::Le => "<=",
            ComparisonOp::Ge => ">=",
        };
        write!(f, "{symbol}")
    }
}

impl Predicate {
    pub fn new(column: &str, op: ComparisonOp, value: f64) -> Predicate {
        let column = if column == NIL_STATE {
            NIL_STATE.to_string()
        } else {
            let nodes = column.split("--").map(|it| it.trim()).collect::<Vec<_>>();
            make_label(&nodes)
        };
        Predicate { column, op, value }
    }

    /// Canonical name of the filtered column.
    pub fn get_column(&self) -> &str {
        &self.column
    }

    pub fn get_op(&self) -> ComparisonOp {
        self.op
    }

    pub fn get_value(&self) -> f64 {
        self.value
    }

    /// Index values of all rows of `table` which satisfy this predicate.
    ///
    /// Fails with `InvalidPredicate` if the table has no column of this predicate.
    pub fn select<R: Clone + Ord>(
        &self,
        table: &ProbabilityTable<R>,
    ) -> Result<BTreeSet<R>, MabossError> {
        let column = table.column(&self.column).ok_or_else(|| {
            MabossError::InvalidPredicate(format!("Unknown column `{}`.", self.column))
        })?;
        Ok(table
            .index()
            .iter()
            .zip(column)
            .filter(|(_, value)| self.op.apply(*value, self.value))
            .map(|(row, _)| row.clone())
            .collect())
    }
}

impl FromStr for Predicate {
    type Err = MabossError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let captures = PREDICATE_REGEX.captures(value).ok_or_else(|| {
            MabossError::InvalidPredicate(format!(
                "Expected `<column> <op> <number>`, but found `{value}`."
            ))
        })?;
        let op = ComparisonOp::from_str(&captures[2])?;
        let threshold = captures[3].parse::<f64>().map_err(|_| {
            MabossError::InvalidPredicate(format!("Invalid number `{}`.", &captures[3]))
        })?;
        Ok(Predicate::new(&captures[1], op, threshold))
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{} {} {}", self.column, self.op, self.value)
    }
}

#[cfg(test)]
mod tests {
    use crate::ensemble::{ComparisonOp, Predicate};
    use crate::result::ProbabilityTable;
    use crate::MabossError;
    use std::collections::BTreeSet;
    use std::str::FromStr;

    #[test]
    fn parse_predicates() {
        let predicate = Predicate::from_str("p53 > 0.5").unwrap();
        assert_eq!("p53", predicate.get_column());
        assert_eq!(ComparisonOp::Gt, predicate.get_op());
        assert_eq!(0.5, predicate.get_value());

        let predicate = Predicate::from_str("  B -- A<=1e-2 ").unwrap();
        assert_eq!("A -- B", predicate.get_column());
        assert_eq!(ComparisonOp::Le, predicate.get_op());
        assert_eq!(0.01, predicate.get_value());

        let predicate = Predicate::from_str("<nil> != 0").unwrap();
        assert_eq!("<nil>", predicate.get_column());
        assert_eq!("<nil> != 0", predicate.to_string());

        for op in ["<", ">", "==", "!=", "<=", ">="] {
            let predicate = Predicate::from_str(&format!("A {op} .5")).unwrap();
            assert_eq!(op, predicate.get_op().to_string());
        }
    }

    #[test]
    fn parse_invalid_predicates() {
        for input in ["", "A", "A > ", "> 0.5", "A >> 0.5", "A = 0.5", "A > x", "1A > 0", "A -- > 1"] {
            assert!(
                matches!(Predicate::from_str(input), Err(MabossError::InvalidPredicate(_))),
                "Accepted `{}`",
                input
            );
        }
    }

    #[test]
    fn select_rows() {
        let table = ProbabilityTable::from_values(
            vec![0usize, 1, 2],
            vec!["A".to_string()],
            vec![vec![0.9], vec![0.2], vec![0.6]],
        );
        let selected = Predicate::from_str("A > 0.5").unwrap().select(&table).unwrap();
        assert_eq!(BTreeSet::from([0, 2]), selected);
        let selected = Predicate::from_str("A == 0.2").unwrap().select(&table).unwrap();
        assert_eq!(BTreeSet::from([1]), selected);
        assert!(matches!(
            Predicate::from_str("B > 0.5").unwrap().select(&table),
            Err(MabossError::InvalidPredicate(_))
        ));
    }
}
