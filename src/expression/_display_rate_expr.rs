use crate::expression::RateExpr::*;
use crate::expression::{RateExpr, RateOp};
use std::fmt::{Display, Error, Formatter};

impl Display for RateOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let symbol = match self {
            RateOp::And => "&",
            RateOp::Or => "|",
            RateOp::Xor => "^",
            RateOp::Add => "+",
            RateOp::Sub => "-",
            RateOp::Mul => "*",
            RateOp::Div => "/",
            RateOp::Eq => "==",
            RateOp::Neq => "!=",
            RateOp::Lt => "<",
            RateOp::Gt => ">",
            RateOp::Le => "<=",
            RateOp::Ge => ">=",
        };
        write!(f, "{symbol}")
    }
}

impl Display for RateExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            // Debug formatting gives the shortest representation which parses back to
            // the same value (`1e308` instead of 309 digits).
            Const(value) => write!(f, "{value:?}")?,
            Bool(true) => write!(f, "True")?,
            Bool(false) => write!(f, "False")?,
            Node(name) => write!(f, "{name}")?,
            Param(name) => write!(f, "${name}")?,
            Attribute(name) => write!(f, "@{name}")?,
            Not(inner) => write!(f, "!{inner}")?,
            Neg(inner) => write!(f, "-{inner}")?,
            Binary(op, l, r) => write!(f, "({l} {op} {r})")?,
            Ternary(condition, then, other) => write!(f, "({condition} ? {then} : {other})")?,
        }
        Ok(())
    }
}
