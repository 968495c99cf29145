//! `MID`, `SUBSTITUTE`, `REPLACE` — the functions that splice text by
//! position or by matched content rather than just trimming an end.

use std::sync::Arc;

use formualizer_common::ExcelErrorKind;

use crate::builtins::util::{number_of, text_of};
use crate::context::EvalContext;
use crate::function::Function;
use crate::value::Value;

pub struct MidFn;

impl Function for MidFn {
    fn name(&self) -> &'static str {
        "MID"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        let s = match text_of(&args[0]) {
            Ok(s) => s,
            Err(e) => return e,
        };
        let start = match number_of(&args[1]) {
            Ok(n) => n as i64,
            Err(e) => return e,
        };
        let num_chars = match number_of(&args[2]) {
            Ok(n) => n as i64,
            Err(e) => return e,
        };
        if start < 1 {
            return Value::error(ExcelErrorKind::Value, "MID: start_num must be at least 1");
        }
        if num_chars < 0 {
            return Value::error(ExcelErrorKind::Value, "MID: num_chars must not be negative");
        }
        let chars: Vec<char> = s.chars().collect();
        let start = (start as usize) - 1;
        if start >= chars.len() {
            return Value::Text(String::new());
        }
        let end = (start + num_chars as usize).min(chars.len());
        Value::Text(chars[start..end].iter().collect())
    }
}

/// `SUBSTITUTE(text, old_text, new_text, [instance_num])` — case-sensitive,
/// literal (not wildcard) matching. Omitting `instance_num` replaces every
/// occurrence; supplying it replaces only that one occurrence, leaving the
/// text unchanged if it doesn't occur that many times. An empty `old_text`
/// never matches, so the text comes back unchanged.
pub struct SubstituteFn;

impl Function for SubstituteFn {
    fn name(&self) -> &'static str {
        "SUBSTITUTE"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(4)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        let text = match text_of(&args[0]) {
            Ok(s) => s,
            Err(e) => return e,
        };
        let old = match text_of(&args[1]) {
            Ok(s) => s,
            Err(e) => return e,
        };
        let new = match text_of(&args[2]) {
            Ok(s) => s,
            Err(e) => return e,
        };
        if old.is_empty() {
            return Value::Text(text);
        }
        match args.get(3) {
            None => Value::Text(text.replace(&old, &new)),
            Some(v) => {
                let instance = match number_of(v) {
                    Ok(n) => n as i64,
                    Err(e) => return e,
                };
                if instance < 1 {
                    return Value::error(
                        ExcelErrorKind::Value,
                        "SUBSTITUTE: instance_num must be at least 1",
                    );
                }
                Value::Text(replace_nth(&text, &old, &new, instance as usize))
            }
        }
    }
}

fn replace_nth(text: &str, old: &str, new: &str, n: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut seen = 0usize;
    loop {
        match rest.find(old) {
            Some(idx) => {
                seen += 1;
                let (before, after) = rest.split_at(idx);
                out.push_str(before);
                if seen == n {
                    out.push_str(new);
                } else {
                    out.push_str(old);
                }
                rest = &after[old.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// `REPLACE(old_text, start_num, num_chars, new_text)` — splices by
/// character position rather than by content match.
pub struct ReplaceFn;

impl Function for ReplaceFn {
    fn name(&self) -> &'static str {
        "REPLACE"
    }

    fn min_args(&self) -> usize {
        4
    }

    fn max_args(&self) -> Option<usize> {
        Some(4)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        let text = match text_of(&args[0]) {
            Ok(s) => s,
            Err(e) => return e,
        };
        let start = match number_of(&args[1]) {
            Ok(n) => n as i64,
            Err(e) => return e,
        };
        let num_chars = match number_of(&args[2]) {
            Ok(n) => n as i64,
            Err(e) => return e,
        };
        let new_text = match text_of(&args[3]) {
            Ok(s) => s,
            Err(e) => return e,
        };
        if start < 1 {
            return Value::error(ExcelErrorKind::Value, "REPLACE: start_num must be at least 1");
        }
        if num_chars < 0 {
            return Value::error(ExcelErrorKind::Value, "REPLACE: num_chars must not be negative");
        }
        let chars: Vec<char> = text.chars().collect();
        let start = ((start as usize) - 1).min(chars.len());
        let end = (start + num_chars as usize).min(chars.len());
        let mut out: String = chars[..start].iter().collect();
        out.push_str(&new_text);
        out.extend(&chars[end..]);
        Value::Text(out)
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
    fn mid_extracts_a_middle_slice() {
        assert_eq!(eval_str("=MID(\"hello world\",7,5)").to_text().unwrap(), "world");
    }

    #[test]
    fn mid_past_the_end_is_empty() {
        assert_eq!(eval_str("=MID(\"hi\",10,5)").to_text().unwrap(), "");
    }

    #[test]
    fn substitute_replaces_every_occurrence_by_default() {
        assert_eq!(
            eval_str("=SUBSTITUTE(\"a-b-c\",\"-\",\"/\")").to_text().unwrap(),
            "a/b/c"
        );
    }

    #[test]
    fn substitute_replaces_only_the_given_instance() {
        assert_eq!(
            eval_str("=SUBSTITUTE(\"a-b-c\",\"-\",\"/\",2)").to_text().unwrap(),
            "a-b/c"
        );
    }

    #[test]
    fn substitute_empty_old_text_is_a_no_op() {
        assert_eq!(eval_str("=SUBSTITUTE(\"abc\",\"\",\"x\")").to_text().unwrap(), "abc");
    }

    #[test]
    fn replace_splices_by_position() {
        assert_eq!(
            eval_str("=REPLACE(\"hello world\",1,5,\"goodbye\")").to_text().unwrap(),
            "goodbye world"
        );
    }

    #[test]
    fn replace_rejects_start_below_one() {
        let v = eval_str("=REPLACE(\"hi\",0,1,\"x\")");
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Value);
    }
}
