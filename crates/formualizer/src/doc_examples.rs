use formualizer_common::{ExcelError, LiteralValue};
use formualizer_eval::interpreter::evaluate;
use formualizer_eval::test_workbook::TestWorkbook;
use formualizer_eval::value::Value;

/// Evaluate a formula against an empty workbook and return the resulting
/// scalar value.
///
/// This helper is intended for documentation examples to avoid repetitive
/// setup; a real embedder builds its own `EvalContext` over its own cell
/// storage instead.
///
/// # Example
///
/// ```rust
/// # use formualizer::doc_examples::eval_scalar;
/// let value = eval_scalar("=LET(x, 2, y, x * x, y + 1)")?;
/// assert_eq!(value, formualizer::LiteralValue::Number(5.0));
/// # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
/// ```
pub fn eval_scalar(formula: &str) -> Result<LiteralValue, Box<dyn std::error::Error + Send + Sync>> {
    let ast = formualizer_parse::parse(formula)?;
    let ctx = TestWorkbook::new().into_ctx();
    match evaluate(&ast, &ctx) {
        Value::Error(e) => Err(Box::new(DocExampleError(e))),
        value => Ok(value_to_literal(value)),
    }
}

fn value_to_literal(value: Value) -> LiteralValue {
    match value {
        Value::Number(n) => LiteralValue::Number(n),
        Value::Text(s) => LiteralValue::Text(s),
        Value::Boolean(b) => LiteralValue::Boolean(b),
        Value::Empty | Value::Function(_) | Value::Omitted => LiteralValue::Empty,
        Value::Error(e) => LiteralValue::Error(e),
        Value::Range(r) => LiteralValue::Array(
            r.rows_iter()
                .map(|row| row.iter().cloned().map(value_to_literal).collect())
                .collect(),
        ),
    }
}

#[derive(Debug)]
struct DocExampleError(ExcelError);

impl std::fmt::Display for DocExampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for DocExampleError {}
