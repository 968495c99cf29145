//! The runtime value lattice: what an expression evaluates *to*, as opposed
//! to `formualizer_common::LiteralValue` (what a parsed expression can carry
//! *literally*). `Value` adds the two things only the evaluation core can
//! produce — resolved ranges and first-class function values — on top of
//! the parser's literal set.

use std::fmt;
use std::sync::Arc;

use formualizer_common::{ExcelError, ExcelErrorKind, LiteralValue};

use crate::function::Callable;

/// A rectangular, row-major block of values, as produced by resolving a
/// range reference or returned by an array-producing builtin (`MAKEARRAY`,
/// `BYROW`, …). Cheap to clone: the backing grid is shared.
#[derive(Clone)]
pub struct RangeValue {
    data: Arc<Vec<Vec<Value>>>,
}

impl RangeValue {
    /// `rows` must be non-empty and rectangular (every row the same length).
    pub fn new(rows: Vec<Vec<Value>>) -> Self {
        Self {
            data: Arc::new(rows),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.len()
    }

    pub fn cols(&self) -> usize {
        self.data.first().map_or(0, |r| r.len())
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.data.get(row).and_then(|r| r.get(col))
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = &Vec<Value>> {
        self.data.iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.data.iter().flatten()
    }

    pub fn as_slice(&self) -> &[Vec<Value>] {
        &self.data
    }

    /// The single cell, if this range happens to be 1x1 — the shape some
    /// array combinators require their inputs to agree on.
    pub fn as_scalar(&self) -> Option<&Value> {
        if self.rows() == 1 && self.cols() == 1 {
            self.get(0, 0)
        } else {
            None
        }
    }

    /// The top-left cell, used by scalar coercions: a Range used where a
    /// scalar is expected reduces to its first cell, regardless of shape.
    pub fn first_cell(&self) -> &Value {
        self.get(0, 0).expect("RangeValue is never 0x0")
    }
}

impl fmt::Debug for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RangeValue({}x{})", self.rows(), self.cols())
    }
}

/// The tagged value every expression evaluates to.
#[derive(Clone)]
pub enum Value {
    Number(f64),
    Text(String),
    Boolean(bool),
    Empty,
    Range(RangeValue),
    Error(ExcelError),
    Function(Arc<dyn Callable>),
    /// A trailing optional argument the caller didn't supply. Distinct from
    /// `Empty` so `ISOMITTED` can tell "omitted" apart from "blank cell".
    Omitted,
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Text(s) => write!(f, "Text({s:?})"),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Empty => write!(f, "Empty"),
            Value::Range(r) => write!(f, "{r:?}"),
            Value::Error(e) => write!(f, "Error({e})"),
            Value::Function(_) => write!(f, "Function(<closure>)"),
            Value::Omitted => write!(f, "Omitted"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Empty, Value::Empty) => true,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Omitted, Value::Omitted) => true,
            // Ranges and functions don't have a meaningful equality in the
            // formula language itself (comparison operators coerce them
            // away before this point), so treat them as never equal.
            _ => false,
        }
    }
}

impl From<LiteralValue> for Value {
    fn from(lit: LiteralValue) -> Self {
        match lit {
            LiteralValue::Number(n) => Value::Number(n),
            LiteralValue::Text(s) => Value::Text(s),
            LiteralValue::Boolean(b) => Value::Boolean(b),
            LiteralValue::Empty => Value::Empty,
            LiteralValue::Error(e) => Value::Error(e),
            LiteralValue::Array(rows) => Value::Range(RangeValue::new(
                rows.into_iter()
                    .map(|row| row.into_iter().map(Value::from).collect())
                    .collect(),
            )),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl Value {
    pub fn error(kind: ExcelErrorKind, message: impl Into<String>) -> Self {
        Value::Error(ExcelError::new(kind).with_message(message))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn as_error(&self) -> Option<&ExcelError> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => s.trim().parse::<f64>().is_ok_and(|n| n != 0.0),
            Value::Empty | Value::Error(_) | Value::Function(_) | Value::Omitted => false,
            Value::Range(r) => r.first_cell().is_truthy(),
        }
    }

    /// Coerce to a number the way arithmetic operators and numeric builtins
    /// do: booleans become 1/0, text must parse outright as the *whole*
    /// trimmed string, a Range reduces to its first cell, and a Function or
    /// Omitted has no numeric reading.
    pub fn to_number(&self) -> Result<f64, ExcelError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Empty => Ok(0.0),
            Value::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ExcelError::new(ExcelErrorKind::Value)),
            Value::Error(e) => Err(e.clone()),
            Value::Range(r) => r.first_cell().to_number(),
            Value::Function(_) | Value::Omitted => Err(ExcelError::new(ExcelErrorKind::Value)),
        }
    }

    /// Coerce to text the way `&` concatenation and text builtins do.
    /// `Function` and `Omitted` have no natural textual form; we pick the
    /// stable sentinels `"#LAMBDA"` and `""` respectively rather than treat
    /// the coercion as failing, per the documented design choice for these
    /// two implementation-defined cases.
    pub fn to_text(&self) -> Result<String, ExcelError> {
        match self {
            Value::Number(n) => Ok(format_number(*n)),
            Value::Text(s) => Ok(s.clone()),
            Value::Boolean(b) => Ok(if *b { "TRUE".into() } else { "FALSE".into() }),
            Value::Empty => Ok(String::new()),
            Value::Error(e) => Err(e.clone()),
            Value::Range(r) => r.first_cell().to_text(),
            Value::Function(_) => Ok("#LAMBDA".to_string()),
            Value::Omitted => Ok(String::new()),
        }
    }
}

/// Render a number the way Excel's "General" format does: no trailing
/// zeros, no exponent for ordinary magnitudes.
pub fn format_number(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        let mut s = format!("{n}");
        if s.contains('e') || s.contains('E') {
            s = format!("{n:e}");
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_to_text_has_no_trailing_zero() {
        assert_eq!(Value::Number(3.0).to_text().unwrap(), "3");
        assert_eq!(Value::Number(3.5).to_text().unwrap(), "3.5");
    }

    #[test]
    fn boolean_to_number() {
        assert_eq!(Value::Boolean(true).to_number().unwrap(), 1.0);
        assert_eq!(Value::Boolean(false).to_number().unwrap(), 0.0);
    }

    #[test]
    fn range_coerces_through_its_first_cell() {
        let scalar = RangeValue::new(vec![vec![Value::Number(5.0)]]);
        assert_eq!(Value::Range(scalar).to_number().unwrap(), 5.0);

        let wide = RangeValue::new(vec![vec![Value::Number(1.0), Value::Number(2.0)]]);
        assert_eq!(Value::Range(wide).to_number().unwrap(), 1.0);
    }

    #[test]
    fn function_and_omitted_have_sentinel_text() {
        assert_eq!(Value::Omitted.to_text().unwrap(), "");
    }

    #[test]
    fn error_propagates_through_coercion() {
        let err = Value::Error(ExcelError::new(ExcelErrorKind::Div));
        assert_eq!(err.to_number().unwrap_err().kind, ExcelErrorKind::Div);
    }
}
