use crate::expression::{RateExpr, RateOp};
use crate::{MabossError, MutationState, Node, RateLogic};
use std::fmt::{Display, Error, Formatter};
use std::str::FromStr;

/// The "near infinite" rate of a forced transition.
///
/// It is divided by the number of mutated nodes, so that the simulator can sum all forced
/// rates of a state without overflowing, while each of them still dominates any finite
/// rate of the model.
pub const FORCED_RATE: f64 = 1e308;

impl MutationState {
    /// The `($Low_<node>, $High_<node>)` values which select this state.
    pub fn parameter_values(&self) -> (f64, f64) {
        match self {
            MutationState::On => (0.0, 1.0),
            MutationState::Off => (1.0, 0.0),
            MutationState::WildType => (0.0, 0.0),
        }
    }

    /// Decode a `($Low_<node>, $High_<node>)` pair.
    ///
    /// Any non-zero value counts as set. Both parameters being set is not a valid
    /// combination, because the gated rates would then freeze the node in its current value.
    pub fn try_from_parameters(low: f64, high: f64) -> Result<MutationState, MabossError> {
        match (low != 0.0, high != 0.0) {
            (false, false) => Ok(MutationState::WildType),
            (true, false) => Ok(MutationState::Off),
            (false, true) => Ok(MutationState::On),
            (true, true) => Err(MabossError::InvalidParameter(format!(
                "Low ({low}) and High ({high}) mutation parameters cannot be both set."
            ))),
        }
    }
}

impl FromStr for MutationState {
    type Err = MabossError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ON" => Ok(MutationState::On),
            "OFF" => Ok(MutationState::Off),
            "WT" => Ok(MutationState::WildType),
            _ => Err(MabossError::InvalidIdentifier(format!(
                "Mutation state must be `ON`, `OFF` or `WT`, but `{value}` was given."
            ))),
        }
    }
}

impl Display for MutationState {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            MutationState::On => write!(f, "ON"),
            MutationState::Off => write!(f, "OFF"),
            MutationState::WildType => write!(f, "WT"),
        }
    }
}

/// Name of the parameter which forces `node` to be inactive (without the `$` prefix).
pub fn low_parameter(node: &str) -> String {
    format!("Low_{node}")
}

/// Name of the parameter which forces `node` to be active (without the `$` prefix).
pub fn high_parameter(node: &str) -> String {
    format!("High_{node}")
}

impl Node {
    /// Create a mutable copy of this node.
    ///
    /// The rates of the copy are gated by the `$Low_<node>` and `$High_<node>` parameters:
    ///
    /// ```text
    /// rate_up   = $Low_<node>  ? 0 : ($High_<node> ? 1e308 / mutation_count : rate_up)
    /// rate_down = $High_<node> ? 0 : ($Low_<node>  ? 1e308 / mutation_count : rate_down)
    /// ```
    ///
    /// The gated rates are always built from the *original* rates of the node, so calling
    /// this method on a node which is already a mutant (e.g. because `mutation_count`
    /// changed) never wraps the rates twice. A `mutation_count` of zero is treated as one.
    pub fn to_mutant(&self, mutation_count: usize) -> Node {
        let (up, down) = self.rates.original();
        let (up, down) = (up.clone(), down.clone());
        let low = RateExpr::mk_param(&low_parameter(&self.name));
        let high = RateExpr::mk_param(&high_parameter(&self.name));
        let forced = RateExpr::mk_binary(
            RateOp::Div,
            RateExpr::Const(FORCED_RATE),
            RateExpr::Const(mutation_count.max(1) as f64),
        );
        let gated_up = RateExpr::mk_ternary(
            low.clone(),
            RateExpr::Const(0.0),
            RateExpr::mk_ternary(high.clone(), forced.clone(), up.clone()),
        );
        let gated_down = RateExpr::mk_ternary(
            high,
            RateExpr::Const(0.0),
            RateExpr::mk_ternary(low, forced, down.clone()),
        );
        Node {
            name: self.name.clone(),
            logic: self.logic.clone(),
            rates: RateLogic::Mutated {
                original: (up, down),
                gated: (gated_up, gated_down),
            },
            is_internal: self.is_internal,
        }
    }
}
