//! `VALUE` and `TEXT` — the two functions that cross the number/text
//! boundary in the direction the arithmetic coercions don't already cover.

use std::sync::Arc;

use formualizer_common::ExcelErrorKind;

use crate::builtins::util::text_of;
use crate::context::EvalContext;
use crate::function::Function;
use crate::value::Value;

/// `VALUE(text)` — parses a numeric string, accepting a trailing `%` (read
/// as the usual divide-by-100) and surrounding whitespace; anything else
/// that doesn't parse outright as a number is `#VALUE!`.
pub struct ValueFn;

impl Function for ValueFn {
    fn name(&self) -> &'static str {
        "VALUE"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        if let Value::Number(n) = &args[0] {
            return Value::Number(*n);
        }
        let s = match text_of(&args[0]) {
            Ok(s) => s,
            Err(e) => return e,
        };
        let trimmed = s.trim();
        let (body, percent) = match trimmed.strip_suffix('%') {
            Some(rest) => (rest.trim(), true),
            None => (trimmed, false),
        };
        let cleaned: String = body.chars().filter(|&c| c != ',').collect();
        match cleaned.parse::<f64>() {
            Ok(n) => Value::Number(if percent { n / 100.0 } else { n }),
            Err(_) => Value::error(ExcelErrorKind::Value, format!("VALUE: cannot parse {s:?}")),
        }
    }
}

/// `TEXT(value, format_text)` — a small subset of Excel's format-code
/// language: integer zero-padding (`0`), thousands grouping (`#,##0`),
/// a fixed number of decimal places, percentage (`%`), and scientific
/// notation (`E+00`). Any other format code falls back to the value's
/// ordinary "General" text form.
pub struct TextFn;

impl Function for TextFn {
    fn name(&self) -> &'static str {
        "TEXT"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        let n = match args[0].to_number() {
            Ok(n) => n,
            Err(e) => return Value::Error(e),
        };
        let fmt = match text_of(&args[1]) {
            Ok(s) => s,
            Err(e) => return e,
        };
        Value::Text(format_with(n, &fmt))
    }
}

fn format_with(n: f64, fmt: &str) -> String {
    // `%` anywhere in the format code scales the value by 100 and appends a
    // literal `%` to the result, not just when it trails the code.
    if fmt.contains('%') {
        let code: String = fmt.chars().filter(|&c| c != '%').collect();
        return format!("{}%", format_with(n * 100.0, &code));
    }
    if let Some(idx) = fmt.to_ascii_uppercase().find('E') {
        return format_scientific(n, fmt, idx);
    }
    format_fixed(n, fmt)
}

/// The integer-part zero-padding width (count of `0` placeholders before the
/// decimal point), the fraction-part placeholder string (for trailing-`#`
/// stripping), and whether the integer part asks for thousands grouping.
fn parse_fixed_code(code: &str) -> (usize, &str, bool) {
    let (int_code, frac_code) = match code.find('.') {
        Some(dot) => (&code[..dot], &code[dot + 1..]),
        None => (code, ""),
    };
    let int_zeros = int_code.chars().filter(|c| *c == '0').count();
    let grouped = int_code.contains(',');
    (int_zeros, frac_code, grouped)
}

fn format_fixed(n: f64, code: &str) -> String {
    let (int_zeros, frac_code, grouped) = parse_fixed_code(code);
    let decimals = frac_code.chars().filter(|c| *c == '0' || *c == '#').count();
    let rounded = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (rounded, None),
    };
    let int_part = format!("{int_part:0>int_zeros$}");
    let int_part = if grouped {
        group_thousands(&int_part)
    } else {
        int_part
    };
    let frac_part = frac_part.map(|f| strip_trailing_hash_zeros(&f, frac_code));
    let mut out = String::new();
    if n < 0.0 {
        out.push('-');
    }
    out.push_str(&int_part);
    if let Some(f) = frac_part {
        if !f.is_empty() {
            out.push('.');
            out.push_str(&f);
        }
    }
    out
}

/// Drop trailing digits that line up with a `#` placeholder (rather than a
/// `0` one) and happen to be zero — `#` means "show if present", `0` means
/// "always show".
fn strip_trailing_hash_zeros(frac: &str, frac_code: &str) -> String {
    let placeholders: Vec<char> = frac_code.chars().collect();
    let mut chars: Vec<char> = frac.chars().collect();
    while let Some(&last) = chars.last() {
        let pos = chars.len() - 1;
        if pos < placeholders.len() && placeholders[pos] == '#' && last == '0' {
            chars.pop();
        } else {
            break;
        }
    }
    chars.into_iter().collect()
}

fn group_thousands(digits: &str) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut grouped = String::with_capacity(chars.len() + chars.len() / 3);
    for (i, c) in chars.iter().enumerate() {
        let from_end = chars.len() - i;
        if i != 0 && from_end % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    grouped
}

fn format_scientific(n: f64, code: &str, e_idx: usize) -> String {
    let mantissa_code = &code[..e_idx];
    let decimals = match mantissa_code.find('.') {
        Some(dot) => mantissa_code[dot + 1..]
            .chars()
            .filter(|c| *c == '0' || *c == '#')
            .count(),
        None => 0,
    };
    let exp_digits = code[e_idx + 2..].chars().filter(|c| *c == '0').count().max(1);

    if n == 0.0 {
        let mantissa = format!("{:.*}", decimals, 0.0);
        return format!("{mantissa}E+{:0width$}", 0, width = exp_digits);
    }

    let sign = if n < 0.0 { "-" } else { "" };
    let abs = n.abs();
    let mut exponent = abs.log10().floor() as i32;
    let mut mantissa = abs / 10f64.powi(exponent);
    // Rounding the mantissa to `decimals` places can push it to 10.0;
    // renormalize if so.
    let rounded = format!("{:.*}", decimals, mantissa);
    if rounded.starts_with("10") {
        exponent += 1;
        mantissa = abs / 10f64.powi(exponent);
    }
    let mantissa_str = format!("{:.*}", decimals, mantissa);
    let exp_sign = if exponent < 0 { "-" } else { "+" };
    format!(
        "{sign}{mantissa_str}E{exp_sign}{:0width$}",
        exponent.abs(),
        width = exp_digits
    )
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
    fn value_parses_plain_numbers() {
        assert_eq!(eval_str("=VALUE(\"42.5\")").to_number().unwrap(), 42.5);
    }

    #[test]
    fn value_parses_percent_suffix() {
        assert_eq!(eval_str("=VALUE(\"50%\")").to_number().unwrap(), 0.5);
    }

    #[test]
    fn value_rejects_non_numeric_text() {
        let v = eval_str("=VALUE(\"abc\")");
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Value);
    }

    #[test]
    fn text_grouped_fixed_point() {
        assert_eq!(
            eval_str("=TEXT(1234.5,\"#,##0.00\")").to_text().unwrap(),
            "1,234.50"
        );
    }

    #[test]
    fn text_percent_format() {
        assert_eq!(eval_str("=TEXT(0.125,\"0.0%\")").to_text().unwrap(), "12.5%");
    }

    #[test]
    fn text_percent_format_not_trailing() {
        // `%` followed by another character (here a trailing space) used to
        // be missed by `strip_suffix('%')`, silently skipping the x100 scale.
        assert_eq!(eval_str("=TEXT(0.125,\"0.0% \")").to_text().unwrap(), "12.5%");
    }

    #[test]
    fn text_scientific_format() {
        assert_eq!(
            eval_str("=TEXT(12345,\"0.00E+00\")").to_text().unwrap(),
            "1.23E+04"
        );
    }

    #[test]
    fn text_integer_zero_padding() {
        assert_eq!(eval_str("=TEXT(7,\"000\")").to_text().unwrap(), "007");
    }
}
