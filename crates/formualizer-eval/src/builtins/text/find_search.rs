//! `FIND` and `SEARCH` — both locate a substring's 1-based position, but
//! `FIND` is a literal, case-sensitive substring search while `SEARCH` is
//! case-insensitive and understands the `?`/`*`/`~` wildcard mini-language.

use std::sync::Arc;

use formualizer_common::ExcelErrorKind;

use crate::builtins::util::{number_of, text_of};
use crate::context::EvalContext;
use crate::function::Function;
use crate::value::Value;

/// `start_num` is 1-indexed; a nonempty needle additionally requires
/// `start_num <= hay_len` (an empty needle may still match one past the end).
fn start_index(
    args: &[Value],
    at: usize,
    hay_len: usize,
    needle_empty: bool,
) -> Result<usize, Value> {
    let start_num = if args.len() > at {
        match number_of(&args[at]) {
            Ok(n) => n as i64,
            Err(e) => return Err(e),
        }
    } else {
        1
    };
    if start_num < 1 {
        return Err(Value::error(
            ExcelErrorKind::Value,
            "start_num must be at least 1",
        ));
    }
    let idx = (start_num as usize) - 1;
    let limit = if needle_empty {
        hay_len
    } else {
        hay_len.saturating_sub(1)
    };
    if idx > limit {
        return Err(Value::error(
            ExcelErrorKind::Value,
            "start_num is past the end of the text",
        ));
    }
    Ok(idx)
}

/// `FIND(find_text, within_text, [start_num])` — literal, case-sensitive.
pub struct FindFn;

impl Function for FindFn {
    fn name(&self) -> &'static str {
        "FIND"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        let needle: Vec<char> = match text_of(&args[0]) {
            Ok(s) => s.chars().collect(),
            Err(e) => return e,
        };
        let hay: Vec<char> = match text_of(&args[1]) {
            Ok(s) => s.chars().collect(),
            Err(e) => return e,
        };
        let start = match start_index(args, 2, hay.len(), needle.is_empty()) {
            Ok(i) => i,
            Err(e) => return e,
        };
        if needle.is_empty() {
            return Value::Number((start + 1) as f64);
        }
        if hay.len() >= needle.len() {
            for s in start..=(hay.len() - needle.len()) {
                if hay[s..s + needle.len()] == needle[..] {
                    return Value::Number((s + 1) as f64);
                }
            }
        }
        Value::error(ExcelErrorKind::Value, "FIND: text not found")
    }
}

#[derive(Clone)]
enum Token {
    Lit(char),
    Any,
    Star,
}

fn parse_pattern(find_text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = find_text.chars();
    while let Some(c) = chars.next() {
        match c {
            '~' => tokens.push(Token::Lit(chars.next().unwrap_or('~'))),
            '?' => tokens.push(Token::Any),
            '*' => tokens.push(Token::Star),
            other => tokens.push(Token::Lit(other)),
        }
    }
    tokens
}

fn matches_from(tokens: &[Token], hay: &[char], pos: usize) -> bool {
    match tokens.first() {
        None => true,
        Some(Token::Lit(c)) => {
            pos < hay.len()
                && hay[pos].to_ascii_lowercase() == c.to_ascii_lowercase()
                && matches_from(&tokens[1..], hay, pos + 1)
        }
        Some(Token::Any) => pos < hay.len() && matches_from(&tokens[1..], hay, pos + 1),
        Some(Token::Star) => (pos..=hay.len()).any(|k| matches_from(&tokens[1..], hay, k)),
    }
}

/// `SEARCH(find_text, within_text, [start_num])` — case-insensitive,
/// supports `?` (any one character), `*` (any run of characters) and `~`
/// (escapes the following wildcard so it matches literally).
pub struct SearchFn;

impl Function for SearchFn {
    fn name(&self) -> &'static str {
        "SEARCH"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        let pattern_text = match text_of(&args[0]) {
            Ok(s) => s,
            Err(e) => return e,
        };
        let hay: Vec<char> = match text_of(&args[1]) {
            Ok(s) => s.chars().collect(),
            Err(e) => return e,
        };
        let start = match start_index(args, 2, hay.len(), pattern_text.is_empty()) {
            Ok(i) => i,
            Err(e) => return e,
        };
        let tokens = parse_pattern(&pattern_text);
        for s in start..=hay.len() {
            if matches_from(&tokens, &hay, s) {
                return Value::Number((s + 1) as f64);
            }
        }
        Value::error(ExcelErrorKind::Value, "SEARCH: text not found")
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
    fn find_is_case_sensitive_and_literal() {
        assert_eq!(eval_str("=FIND(\"?\",\"a?b\")").to_number().unwrap(), 2.0);
        let v = eval_str("=FIND(\"A\",\"abc\")");
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Value);
    }

    #[test]
    fn search_is_case_insensitive() {
        assert_eq!(eval_str("=SEARCH(\"A\",\"abc\")").to_number().unwrap(), 1.0);
    }

    #[test]
    fn search_escaped_wildcard_matches_literally() {
        assert_eq!(eval_str("=SEARCH(\"~?\",\"a?b\")").to_number().unwrap(), 2.0);
    }

    #[test]
    fn search_question_mark_matches_one_char() {
        assert_eq!(eval_str("=SEARCH(\"a?c\",\"xabcx\")").to_number().unwrap(), 2.0);
    }

    #[test]
    fn search_star_matches_any_run() {
        assert_eq!(eval_str("=SEARCH(\"a*d\",\"xabcdx\")").to_number().unwrap(), 2.0);
    }

    #[test]
    fn search_respects_start_num() {
        assert_eq!(
            eval_str("=SEARCH(\"a\",\"banana\",3)").to_number().unwrap(),
            4.0
        );
    }

    #[test]
    fn find_empty_needle_returns_start_position() {
        assert_eq!(eval_str("=FIND(\"\",\"abc\")").to_number().unwrap(), 1.0);
    }
}
