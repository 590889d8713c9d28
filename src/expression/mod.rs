//! Rate and logic expressions of MaBoSS models.
//!
//! MaBoSS uses a single expression language both for the Boolean `logic` of a node and for
//! its (real valued) `rate_up`/`rate_down` rates. Booleans are simply numbers: `0` is false
//! and anything else is true. An expression can reference:
//!
//!  - other nodes by name (`CycD & !p53`),
//!  - global parameters with a `$` prefix (`$Low_p53`),
//!  - node attributes with a `@` prefix (typically `@logic`).
//!
//! ```rust
//! use biodivine_lib_maboss::expression::{RateExpr, Valuation};
//! use std::convert::TryFrom;
//!
//! let rate = RateExpr::try_from("@logic ? $k_up : 0.0").unwrap();
//! let valuation = Valuation::new()
//!     .with_attribute("logic", 1.0)
//!     .with_parameter("k_up", 2.5);
//! assert_eq!(2.5, rate.evaluate(&valuation).unwrap());
//! ```

use std::collections::HashMap;

/// **(internal)** Convert `RateExpr` back to an expression string.
mod _display_rate_expr;
/// **(internal)** `RateExpr` parsing.
mod _from_string_for_rate_expr;
/// **(internal)** Inspection, validation and evaluation of `RateExpr`.
mod _impl_rate_expr;
/// **(internal)** Utility methods for `Valuation`.
mod _impl_valuation;

pub use _impl_rate_expr::check_logic_defined;

/// Binary operators that can appear in a `RateExpr`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RateOp {
    And,
    Or,
    Xor,
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
}

/// A parsed MaBoSS expression.
#[derive(Clone, Debug, PartialEq)]
pub enum RateExpr {
    Const(f64),
    Bool(bool),
    // Reference to a network node.
    Node(String),
    // Reference to a global parameter (stored without the `$` prefix).
    Param(String),
    // Reference to a node attribute (stored without the `@` prefix).
    Attribute(String),
    Not(Box<RateExpr>),
    Neg(Box<RateExpr>),
    Binary(RateOp, Box<RateExpr>, Box<RateExpr>),
    // `condition ? then : else`
    Ternary(Box<RateExpr>, Box<RateExpr>, Box<RateExpr>),
}

/// Values of nodes, parameters and attributes used to evaluate a `RateExpr`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Valuation {
    nodes: HashMap<String, bool>,
    parameters: HashMap<String, f64>,
    attributes: HashMap<String, f64>,
}
