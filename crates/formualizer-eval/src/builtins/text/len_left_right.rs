//! `LEN`, `LEFT`, `RIGHT` — code-point based, not byte based, so multi-byte
//! characters count as one position.

use std::sync::Arc;

use formualizer_common::ExcelErrorKind;

use crate::builtins::util::{number_of, text_of};
use crate::context::EvalContext;
use crate::function::Function;
use crate::value::Value;

pub struct LenFn;

impl Function for LenFn {
    fn name(&self) -> &'static str {
        "LEN"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        match text_of(&args[0]) {
            Ok(s) => Value::Number(s.chars().count() as f64),
            Err(e) => e,
        }
    }
}

fn take_n(args: &[Value]) -> Result<i64, Value> {
    if args.len() == 2 {
        let n = number_of(&args[1])?;
        Ok(n as i64)
    } else {
        Ok(1)
    }
}

pub struct LeftFn;

impl Function for LeftFn {
    fn name(&self) -> &'static str {
        "LEFT"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        let s = match text_of(&args[0]) {
            Ok(s) => s,
            Err(e) => return e,
        };
        let n = match take_n(args) {
            Ok(n) => n,
            Err(e) => return e,
        };
        if n < 0 {
            return Value::error(ExcelErrorKind::Value, "LEFT: num_chars must not be negative");
        }
        let chars: Vec<char> = s.chars().collect();
        let take = (n as usize).min(chars.len());
        Value::Text(chars[..take].iter().collect())
    }
}

pub struct RightFn;

impl Function for RightFn {
    fn name(&self) -> &'static str {
        "RIGHT"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        let s = match text_of(&args[0]) {
            Ok(s) => s,
            Err(e) => return e,
        };
        let n = match take_n(args) {
            Ok(n) => n,
            Err(e) => return e,
        };
        if n < 0 {
            return Value::error(ExcelErrorKind::Value, "RIGHT: num_chars must not be negative");
        }
        let chars: Vec<char> = s.chars().collect();
        let start = chars.len().saturating_sub(n as usize);
        Value::Text(chars[start..].iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::evaluate;
    use crate::test_workbook::TestWorkbook;
    use formualizer_common::ExcelErrorKind;
    use formualizer_parse::parse;

    fn eval_str(formula: &str) -> crate::value::Value {
        let ast = parse(formula).expect("parses");
        let ctx = TestWorkbook::new().into_ctx();
        evaluate(&ast, &ctx)
    }

    #[test]
    fn len_counts_code_points() {
        assert_eq!(eval_str("=LEN(\"hello\")").to_number().unwrap(), 5.0);
        assert_eq!(eval_str("=LEN(\"\")").to_number().unwrap(), 0.0);
    }

    #[test]
    fn left_and_right_default_to_one_char() {
        assert_eq!(eval_str("=LEFT(\"hello\")").to_text().unwrap(), "h");
        assert_eq!(eval_str("=RIGHT(\"hello\")").to_text().unwrap(), "o");
    }

    #[test]
    fn left_and_right_clamp_past_the_end() {
        assert_eq!(eval_str("=LEFT(\"hi\",10)").to_text().unwrap(), "hi");
        assert_eq!(eval_str("=RIGHT(\"hi\",10)").to_text().unwrap(), "hi");
    }

    #[test]
    fn negative_count_is_value_error() {
        let v = eval_str("=LEFT(\"hi\",-1)");
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Value);
    }
}
