use crate::result::{FixedPoint, FixedPointTable};
use crate::state_label::{canonicalize, check_label, label_nodes};
use crate::MabossError;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Error, Formatter};

impl FixedPointTable {
    /// Build a table of fixed points with membership vectors over the given `nodes`.
    ///
    /// Fixed points are ordered by their id. Nodes active in a fixed point which are not
    /// listed in `nodes` do not appear in its membership vector.
    pub fn build(
        fixed_points: &BTreeMap<usize, (f64, String)>,
        nodes: &[String],
    ) -> Result<FixedPointTable, MabossError> {
        let mut rows = Vec::with_capacity(fixed_points.len());
        for (id, (probability, state)) in fixed_points {
            check_label(state)?;
            if !probability.is_finite() || *probability < 0.0 || *probability > 1.0 {
                return Err(MabossError::MalformedExport(format!(
                    "Invalid probability {probability} of fixed point #{id}."
                )));
            }
            let active = label_nodes(state);
            let mut membership = bitvector::BitVector::new(nodes.len());
            for (i, node) in nodes.iter().enumerate() {
                if active.contains(&node.as_str()) {
                    membership.insert(i);
                }
            }
            rows.push(FixedPoint {
                id: *id,
                probability: *probability,
                state: canonicalize(state),
                membership,
                num_nodes: nodes.len(),
            });
        }
        Ok(FixedPointTable {
            nodes: nodes.to_vec(),
            fixed_points: rows,
        })
    }

    /// Node names of the membership vectors.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn fixed_points(&self) -> &[FixedPoint] {
        &self.fixed_points
    }

    pub fn len(&self) -> usize {
        self.fixed_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixed_points.is_empty()
    }
}

impl FixedPoint {
    pub fn get_id(&self) -> usize {
        self.id
    }

    pub fn get_probability(&self) -> f64 {
        self.probability
    }

    /// Canonical label of the fixed point state.
    pub fn get_state(&self) -> &str {
        &self.state
    }

    /// True if the node at the given position (of `FixedPointTable::nodes`) is active.
    pub fn is_active(&self, node: usize) -> bool {
        node < self.num_nodes && self.membership.contains(node)
    }

    /// Positions of all active nodes.
    pub fn active_nodes(&self) -> Vec<usize> {
        self.membership.iter().collect()
    }
}

impl Debug for FixedPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(
            f,
            "FixedPoint(#{}, {}, {})[",
            self.id, self.probability, self.state
        )?;
        let mut first = true;
        for i in self.membership.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{i}")?;
            first = false;
        }
        write!(f, "]")
    }
}

/// Same format as the `<prefix>_fp.csv` export of the simulator.
impl Display for FixedPointTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        writeln!(f, "Fixed Points ({})", self.fixed_points.len())?;
        write!(f, "FP\tProba\tState")?;
        for node in &self.nodes {
            write!(f, "\t{node}")?;
        }
        writeln!(f)?;
        for point in &self.fixed_points {
            write!(f, "#{}\t{}\t{}", point.id, point.probability, point.state)?;
            for i in 0..self.nodes.len() {
                write!(f, "\t{}", u8::from(point.is_active(i)))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parse the fixed point export (`<prefix>_fp.csv`) of the simulator into a map from
/// fixed point ids to their probability and state label.
///
/// The first line (`Fixed Points (n)`) is skipped; the header must start with the
/// `FP`, `Proba` and `State` columns. The per-node columns are ignored, since the
/// membership is recomputed from the state label.
pub fn parse_fixed_points(text: &str) -> Result<BTreeMap<usize, (f64, String)>, MabossError> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty()).skip(1);
    let mut result = BTreeMap::new();
    let Some(header) = lines.next() else {
        // A run without fixed points may export only the first line.
        return Ok(result);
    };
    let header = header.split('\t').map(|it| it.trim()).collect::<Vec<_>>();
    if header.len() < 3 || header[0] != "FP" || header[1] != "Proba" || header[2] != "State" {
        return Err(MabossError::MalformedExport(format!(
            "Unexpected fixed point header `{}`.",
            header.join("\t")
        )));
    }
    for line in lines {
        let fields = line.split('\t').map(|it| it.trim()).collect::<Vec<_>>();
        if fields.len() < 3 {
            return Err(MabossError::MalformedExport(format!(
                "Incomplete fixed point row `{line}`."
            )));
        }
        let id = fields[0]
            .strip_prefix('#')
            .and_then(|it| it.parse::<usize>().ok())
            .ok_or_else(|| {
                MabossError::MalformedExport(format!("Invalid fixed point id `{}`.", fields[0]))
            })?;
        let probability = fields[1].parse::<f64>().map_err(|_| {
            MabossError::MalformedExport(format!(
                "Invalid probability `{}` of fixed point #{id}.",
                fields[1]
            ))
        })?;
        check_label(fields[2])?;
        if result
            .insert(id, (probability, fields[2].to_string()))
            .is_some()
        {
            return Err(MabossError::MalformedExport(format!(
                "Duplicate fixed point #{id}."
            )));
        }
    }
    tracing::debug!(fixed_points = result.len(), "Parsed fixed point export.");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use crate::result::{parse_fixed_points, FixedPointTable};
    use crate::MabossError;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn nodes(names: &[&str]) -> Vec<String> {
        names.iter().map(|it| it.to_string()).collect()
    }

    #[test]
    fn build_fixed_point_table() {
        let mut points = BTreeMap::new();
        points.insert(1, (0.05, "<nil>".to_string()));
        points.insert(0, (0.9, "B -- A".to_string()));
        let table = FixedPointTable::build(&points, &nodes(&["A", "B", "C"])).unwrap();

        assert_eq!(2, table.len());
        let first = &table.fixed_points()[0];
        assert_eq!(0, first.get_id());
        assert_eq!(0.9, first.get_probability());
        assert_eq!("A -- B", first.get_state());
        assert!(first.is_active(0) && first.is_active(1) && !first.is_active(2));
        assert!(!first.is_active(10));
        assert_eq!(vec![0, 1], first.active_nodes());

        let second = &table.fixed_points()[1];
        assert_eq!(1, second.get_id());
        assert!(second.active_nodes().is_empty());

        let expected = "Fixed Points (2)\n\
            FP\tProba\tState\tA\tB\tC\n\
            #0\t0.9\tA -- B\t1\t1\t0\n\
            #1\t0.05\t<nil>\t0\t0\t0\n";
        assert_eq!(expected, table.to_string());
    }

    #[test]
    fn build_rejects_bad_entries() {
        let mut points = BTreeMap::new();
        points.insert(0, (1.5, "A".to_string()));
        assert!(matches!(
            FixedPointTable::build(&points, &nodes(&["A"])),
            Err(MabossError::MalformedExport(_))
        ));
        points.insert(0, (0.5, "A --".to_string()));
        assert!(matches!(
            FixedPointTable::build(&points, &nodes(&["A"])),
            Err(MabossError::MalformedExport(_))
        ));
    }

    #[test]
    fn parse_fixed_point_export() {
        let text = "Fixed Points (1)\n\
            FP\tProba\tState\tMdm2N\tp53_h\tp53\tMdm2C\tDam\n\
            #1\t0.90688\tMdm2N\t1\t0\t0\t0\t0\n";
        let points = parse_fixed_points(text).unwrap();
        assert_eq!(1, points.len());
        assert_eq!(Some(&(0.90688, "Mdm2N".to_string())), points.get(&1));

        let nodes = nodes(&["Mdm2N", "p53_h", "p53", "Mdm2C", "Dam"]);
        let table = FixedPointTable::build(&points, &nodes).unwrap();
        assert_eq!(text, table.to_string());
    }

    #[test]
    fn parse_fixed_points_without_points() {
        assert!(parse_fixed_points("Fixed Points (0)\n").unwrap().is_empty());
        assert!(parse_fixed_points("Fixed Points (0)\nFP\tProba\tState\tA\n")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn parse_fixed_points_malformed() {
        let inputs = vec![
            "Fixed Points (1)\nID\tProba\tState\n#1\t1\tA\n",
            "Fixed Points (1)\nFP\tProba\tState\n1\t1\tA\n",
            "Fixed Points (1)\nFP\tProba\tState\n#1\tx\tA\n",
            "Fixed Points (1)\nFP\tProba\tState\n#1\t0.5\n",
            "Fixed Points (2)\nFP\tProba\tState\n#1\t0.5\tA\n#1\t0.5\tB\n",
        ];
        for input in inputs {
            assert!(
                matches!(parse_fixed_points(input), Err(MabossError::MalformedExport(_))),
                "Accepted `{}`",
                input
            );
        }
    }
}
