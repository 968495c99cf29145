//! `TRIM`, `LOWER`, `UPPER`, `PROPER`, `EXACT`, `CONCAT`, `TEXTJOIN` — the
//! case-normalizing and string-assembling functions.

use std::sync::Arc;

use crate::builtins::util::{flatten, text_of};
use crate::context::EvalContext;
use crate::function::Function;
use crate::value::Value;

pub struct TrimFn;

impl Function for TrimFn {
    fn name(&self) -> &'static str {
        "TRIM"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        match text_of(&args[0]) {
            Ok(s) => Value::Text(s.split_whitespace().collect::<Vec<_>>().join(" ")),
            Err(e) => e,
        }
    }
}

pub struct LowerFn;

impl Function for LowerFn {
    fn name(&self) -> &'static str {
        "LOWER"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        match text_of(&args[0]) {
            Ok(s) => Value::Text(s.to_lowercase()),
            Err(e) => e,
        }
    }
}

pub struct UpperFn;

impl Function for UpperFn {
    fn name(&self) -> &'static str {
        "UPPER"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        match text_of(&args[0]) {
            Ok(s) => Value::Text(s.to_uppercase()),
            Err(e) => e,
        }
    }
}

/// `PROPER(text)` — capitalizes the first letter of each maximal run of
/// alphabetic characters, lowercasing the rest; non-alphabetic characters
/// act as word boundaries without being altered themselves.
pub struct ProperFn;

impl Function for ProperFn {
    fn name(&self) -> &'static str {
        "PROPER"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        match text_of(&args[0]) {
            Ok(s) => {
                let mut out = String::with_capacity(s.len());
                let mut start_of_word = true;
                for c in s.chars() {
                    if c.is_alphabetic() {
                        if start_of_word {
                            out.extend(c.to_uppercase());
                        } else {
                            out.extend(c.to_lowercase());
                        }
                        start_of_word = false;
                    } else {
                        out.push(c);
                        start_of_word = true;
                    }
                }
                Value::Text(out)
            }
            Err(e) => e,
        }
    }
}

/// `EXACT(text1, text2)` — case-sensitive equality, unlike `=`.
pub struct ExactFn;

impl Function for ExactFn {
    fn name(&self) -> &'static str {
        "EXACT"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        let (a, b) = match (text_of(&args[0]), text_of(&args[1])) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), _) | (_, Err(e)) => return e,
        };
        Value::Boolean(a == b)
    }
}

/// `CONCAT(vs…)` (and its `CONCATENATE` alias) — flattens any `Range`
/// arguments in row-major order and joins every cell's text form with no
/// separator.
pub struct ConcatFn;

impl Function for ConcatFn {
    fn name(&self) -> &'static str {
        "CONCAT"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        let mut out = String::new();
        for v in flatten(args) {
            match text_of(v) {
                Ok(s) => out.push_str(&s),
                Err(e) => return e,
            }
        }
        Value::Text(out)
    }
}

/// `TEXTJOIN(delimiter, ignore_empty, text1, [text2, …])`.
pub struct TextJoinFn;

impl Function for TextJoinFn {
    fn name(&self) -> &'static str {
        "TEXTJOIN"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        let delimiter = match text_of(&args[0]) {
            Ok(s) => s,
            Err(e) => return e,
        };
        let ignore_empty = args[1].is_truthy();
        let mut parts = Vec::new();
        for v in flatten(&args[2..]) {
            match text_of(v) {
                Ok(s) => {
                    if !(ignore_empty && s.is_empty()) {
                        parts.push(s);
                    }
                }
                Err(e) => return e,
            }
        }
        Value::Text(parts.join(&delimiter))
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::evaluate;
    use crate::test_workbook::TestWorkbook;
    use formualizer_parse::parse;

    fn eval_str(formula: &str) -> crate::value::Value {
        let ast = parse(formula).expect("parses");
        let ctx = TestWorkbook::new().into_ctx();
        evaluate(&ast, &ctx)
    }

    #[test]
    fn trim_collapses_internal_whitespace() {
        assert_eq!(eval_str("=TRIM(\"  a   b  \")").to_text().unwrap(), "a b");
    }

    #[test]
    fn lower_and_upper_roundtrip() {
        assert_eq!(eval_str("=UPPER(\"MixEd\")").to_text().unwrap(), "MIXED");
        assert_eq!(eval_str("=LOWER(\"MixEd\")").to_text().unwrap(), "mixed");
    }

    #[test]
    fn proper_capitalizes_each_word() {
        assert_eq!(
            eval_str("=PROPER(\"hello world-of RUST\")").to_text().unwrap(),
            "Hello World-Of Rust"
        );
    }

    #[test]
    fn exact_is_case_sensitive() {
        assert_eq!(eval_str("=EXACT(\"abc\",\"abc\")").is_truthy(), true);
        assert_eq!(eval_str("=EXACT(\"abc\",\"ABC\")").is_truthy(), false);
    }

    #[test]
    fn concat_flattens_ranges() {
        assert_eq!(eval_str("=CONCAT({\"a\",\"b\"},\"c\")").to_text().unwrap(), "abc");
    }

    #[test]
    fn concatenate_alias_behaves_like_concat() {
        assert_eq!(eval_str("=CONCATENATE(\"a\",\"b\")").to_text().unwrap(), "ab");
    }

    #[test]
    fn textjoin_ignores_empty_when_requested() {
        assert_eq!(
            eval_str("=TEXTJOIN(\",\",TRUE,\"a\",\"\",\"b\")").to_text().unwrap(),
            "a,b"
        );
    }

    #[test]
    fn textjoin_keeps_empty_when_not_ignoring() {
        assert_eq!(
            eval_str("=TEXTJOIN(\",\",FALSE,\"a\",\"\",\"b\")").to_text().unwrap(),
            "a,,b"
        );
    }
}
