use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use crate::ExcelError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The literal values a parsed expression tree can carry directly: numeric,
/// textual, boolean, blank, inline array constants (`{1,2;3,4}`), and
/// propagated errors. This is the parser-facing literal set — it says nothing
/// about ranges, named bindings, or function values, which only exist once
/// the evaluation core resolves an expression against a context.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    Text(String),
    Boolean(bool),
    Array(Vec<Vec<LiteralValue>>),
    Empty,
    Error(ExcelError),
}

impl Hash for LiteralValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            LiteralValue::Number(n) => n.to_bits().hash(state),
            LiteralValue::Text(s) => s.hash(state),
            LiteralValue::Boolean(b) => b.hash(state),
            LiteralValue::Array(a) => a.hash(state),
            LiteralValue::Empty => state.write_u8(0),
            LiteralValue::Error(e) => e.hash(state),
        }
    }
}

impl Eq for LiteralValue {}

impl Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Number(n) => write!(f, "{n}"),
            LiteralValue::Text(s) => write!(f, "{s}"),
            LiteralValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            LiteralValue::Error(e) => write!(f, "{e}"),
            LiteralValue::Array(a) => write!(f, "{a:?}"),
            LiteralValue::Empty => write!(f, ""),
        }
    }
}

impl LiteralValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            LiteralValue::Boolean(b) => *b,
            LiteralValue::Number(n) => *n != 0.0,
            LiteralValue::Text(s) => s.trim().parse::<f64>().is_ok_and(|n| n != 0.0),
            LiteralValue::Array(arr) => !arr.is_empty(),
            LiteralValue::Error(_) => false,
            LiteralValue::Empty => false,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LiteralValue::Error(_))
    }
}
