use crate::expression::RateExpr::*;
use crate::expression::{RateExpr, RateOp, Valuation};
use crate::MabossError;
use std::collections::HashSet;
use std::convert::TryFrom;

/// Basic constructors which make building gated expressions less verbose.
impl RateExpr {
    /// Create a reference to the global parameter `name` (without the `$` prefix).
    pub fn mk_param(name: &str) -> RateExpr {
        Param(name.to_string())
    }

    /// Create a `condition ? then : other` expression.
    pub fn mk_ternary(condition: RateExpr, then: RateExpr, other: RateExpr) -> RateExpr {
        Ternary(Box::new(condition), Box::new(then), Box::new(other))
    }

    /// Create a binary expression `left op right`.
    pub fn mk_binary(op: RateOp, left: RateExpr, right: RateExpr) -> RateExpr {
        Binary(op, Box::new(left), Box::new(right))
    }
}

/// Inspection and validation.
impl RateExpr {
    /// Write the names of all nodes that appear in this expression into the given set.
    pub fn dump_nodes(&self, result: &mut HashSet<String>) {
        match self {
            Node(name) => {
                result.insert(name.clone());
            }
            Not(inner) | Neg(inner) => inner.dump_nodes(result),
            Binary(_, l, r) => {
                l.dump_nodes(result);
                r.dump_nodes(result);
            }
            Ternary(c, t, e) => {
                c.dump_nodes(result);
                t.dump_nodes(result);
                e.dump_nodes(result);
            }
            Const(_) | Bool(_) | Param(_) | Attribute(_) => {}
        }
    }

    /// Write the names of all global parameters (without the `$` prefix) that appear in
    /// this expression into the given set.
    pub fn dump_parameters(&self, result: &mut HashSet<String>) {
        match self {
            Param(name) => {
                result.insert(name.clone());
            }
            Not(inner) | Neg(inner) => inner.dump_parameters(result),
            Binary(_, l, r) => {
                l.dump_parameters(result);
                r.dump_parameters(result);
            }
            Ternary(c, t, e) => {
                c.dump_parameters(result);
                t.dump_parameters(result);
                e.dump_parameters(result);
            }
            Const(_) | Bool(_) | Node(_) | Attribute(_) => {}
        }
    }

    /// Check that every node referenced by this expression is one of the `known` nodes.
    pub fn validate(&self, known: &HashSet<String>) -> Result<(), MabossError> {
        let mut nodes = HashSet::new();
        self.dump_nodes(&mut nodes);
        let mut unknown = nodes
            .into_iter()
            .filter(|it| !known.contains(it))
            .collect::<Vec<_>>();
        if unknown.is_empty() {
            Ok(())
        } else {
            unknown.sort();
            Err(MabossError::InvalidIdentifier(format!(
                "Unknown node(s) {:?} in `{}`.",
                unknown, self
            )))
        }
    }
}

/// Evaluation.
impl RateExpr {
    /// Evaluate this expression in the given `Valuation`.
    ///
    /// Boolean values are represented as `1.0` and `0.0`, and every non-zero value is
    /// considered true. Only the selected branch of a ternary expression is evaluated.
    pub fn evaluate(&self, valuation: &Valuation) -> Result<f64, MabossError> {
        Ok(match self {
            Const(value) => *value,
            Bool(value) => as_number(*value),
            Node(name) => as_number(valuation.get_node(name).ok_or_else(|| {
                MabossError::InvalidIdentifier(format!("Node `{name}` has no value."))
            })?),
            Param(name) => valuation.get_parameter(name).ok_or_else(|| {
                MabossError::InvalidIdentifier(format!("Parameter `${name}` has no value."))
            })?,
            Attribute(name) => valuation.get_attribute(name).ok_or_else(|| {
                MabossError::InvalidIdentifier(format!("Attribute `@{name}` has no value."))
            })?,
            Not(inner) => as_number(!as_bool(inner.evaluate(valuation)?)),
            Neg(inner) => -inner.evaluate(valuation)?,
            Ternary(condition, then, other) => {
                if as_bool(condition.evaluate(valuation)?) {
                    then.evaluate(valuation)?
                } else {
                    other.evaluate(valuation)?
                }
            }
            Binary(op, l, r) => {
                let l = l.evaluate(valuation)?;
                let r = r.evaluate(valuation)?;
                match op {
                    RateOp::And => as_number(as_bool(l) && as_bool(r)),
                    RateOp::Or => as_number(as_bool(l) || as_bool(r)),
                    RateOp::Xor => as_number(as_bool(l) != as_bool(r)),
                    RateOp::Add => l + r,
                    RateOp::Sub => l - r,
                    RateOp::Mul => l * r,
                    RateOp::Div => l / r,
                    RateOp::Eq => as_number(l == r),
                    RateOp::Neq => as_number(l != r),
                    RateOp::Lt => as_number(l < r),
                    RateOp::Gt => as_number(l > r),
                    RateOp::Le => as_number(l <= r),
                    RateOp::Ge => as_number(l >= r),
                }
            }
        })
    }
}

fn as_number(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn as_bool(value: f64) -> bool {
    value != 0.0
}

/// Check that all `expressions` are syntactically valid and only reference the given
/// node `names`.
///
/// Returns the parsed expressions in the order of the input.
pub fn check_logic_defined(
    names: &[String],
    expressions: &[&str],
) -> Result<Vec<RateExpr>, MabossError> {
    let known = names.iter().cloned().collect::<HashSet<_>>();
    expressions
        .iter()
        .map(|it| {
            let expression = RateExpr::try_from(*it)?;
            expression.validate(&known)?;
            Ok(expression)
        })
        .collect()
}
