use crate::expression::{RateExpr, Valuation};
use crate::{MabossError, Node, RateLogic, ID_REGEX};
use std::convert::TryFrom;

/// Words which the expression parser reads as operators or constants, so they cannot be
/// used as node names.
const RESERVED_NAMES: [&str; 10] = [
    "AND", "OR", "XOR", "NOT", "True", "TRUE", "true", "False", "FALSE", "false",
];

/// Methods for safely constructing new instances of `Node`s.
impl Node {
    /// Create a new `Node` with the given `logic` and the default rates:
    /// `rate_up = @logic ? 1.0 : 0.0` and `rate_down = @logic ? 0.0 : 1.0`.
    pub fn new(name: &str, logic: &str) -> Result<Node, MabossError> {
        Self::assert_valid_name(name)?;
        let logic = RateExpr::try_from(logic)?;
        let up = RateExpr::mk_ternary(
            RateExpr::Attribute("logic".to_string()),
            RateExpr::Const(1.0),
            RateExpr::Const(0.0),
        );
        let down = RateExpr::mk_ternary(
            RateExpr::Attribute("logic".to_string()),
            RateExpr::Const(0.0),
            RateExpr::Const(1.0),
        );
        Ok(Node {
            name: name.to_string(),
            logic: Some(logic),
            rates: RateLogic::Unmutated { up, down },
            is_internal: false,
        })
    }

    /// Create a new `Node` with explicit rates and an optional `logic`.
    pub fn with_rates(
        name: &str,
        logic: Option<&str>,
        rate_up: &str,
        rate_down: &str,
    ) -> Result<Node, MabossError> {
        Self::assert_valid_name(name)?;
        let logic = logic.map(RateExpr::try_from).transpose()?;
        Ok(Node {
            name: name.to_string(),
            logic,
            rates: RateLogic::Unmutated {
                up: RateExpr::try_from(rate_up)?,
                down: RateExpr::try_from(rate_down)?,
            },
            is_internal: false,
        })
    }

    /// Mark this node as internal (or observable). Internal nodes do not appear in the
    /// state labels reported by the simulator.
    pub fn set_internal(&mut self, is_internal: bool) {
        self.is_internal = is_internal;
    }

    /// **(internal)** Utility method to ensure the node name is a valid identifier
    /// and not a reserved word.
    fn assert_valid_name(name: &str) -> Result<(), MabossError> {
        if !ID_REGEX.is_match(name) {
            Err(MabossError::InvalidIdentifier(format!(
                "`{name}` is not a valid node name."
            )))
        } else if RESERVED_NAMES.contains(&name) {
            Err(MabossError::InvalidIdentifier(format!(
                "`{name}` is a reserved word and cannot be a node name."
            )))
        } else {
            Ok(())
        }
    }
}

/// Some basic utility methods for inspecting the `Node`.
impl Node {
    pub fn get_name(&self) -> &String {
        &self.name
    }

    pub fn get_logic(&self) -> Option<&RateExpr> {
        self.logic.as_ref()
    }

    pub fn get_rates(&self) -> &RateLogic {
        &self.rates
    }

    /// The activation rate used in simulation (gated, if the node is a mutant).
    pub fn rate_up(&self) -> &RateExpr {
        self.rates.up()
    }

    /// The inactivation rate used in simulation (gated, if the node is a mutant).
    pub fn rate_down(&self) -> &RateExpr {
        self.rates.down()
    }

    pub fn is_internal(&self) -> bool {
        self.is_internal
    }

    /// True if the rates of this node are controlled by mutation parameters.
    pub fn is_mutant(&self) -> bool {
        matches!(self.rates, RateLogic::Mutated { .. })
    }

    /// Evaluate the `(rate_up, rate_down)` pair of this node.
    ///
    /// If the node has a `logic`, it is evaluated first and made available to the rates
    /// as the `@logic` attribute.
    pub fn evaluate_rates(&self, valuation: &Valuation) -> Result<(f64, f64), MabossError> {
        let mut valuation = valuation.clone();
        if let Some(logic) = &self.logic {
            let value = logic.evaluate(&valuation)?;
            valuation.set_attribute("logic", value);
        }
        Ok((
            self.rate_up().evaluate(&valuation)?,
            self.rate_down().evaluate(&valuation)?,
        ))
    }
}

impl RateLogic {
    /// The effective activation rate.
    pub fn up(&self) -> &RateExpr {
        match self {
            RateLogic::Unmutated { up, .. } => up,
            RateLogic::Mutated { gated, .. } => &gated.0,
        }
    }

    /// The effective inactivation rate.
    pub fn down(&self) -> &RateExpr {
        match self {
            RateLogic::Unmutated { down, .. } => down,
            RateLogic::Mutated { gated, .. } => &gated.1,
        }
    }

    /// The `(up, down)` rates before any mutation was applied.
    pub fn original(&self) -> (&RateExpr, &RateExpr) {
        match self {
            RateLogic::Unmutated { up, down } => (up, down),
            RateLogic::Mutated { original, .. } => (&original.0, &original.1),
        }
    }
}
