//! Shared helpers across the statistical and text function families:
//! flattening variadic/range arguments into a scalar sequence in row-major
//! order, the shape every family's "flatten a Range when a scalar list is
//! needed" rule reduces to.

use crate::value::Value;

/// Flatten a slice of arguments into their constituent scalar cells: a
/// `Range` contributes every cell in row-major order, anything else
/// contributes itself. Mirrors the `flat` operation referenced throughout
/// §4.3 of the function-family contracts.
pub fn flatten(args: &[Value]) -> Vec<&Value> {
    let mut out = Vec::new();
    for v in args {
        match v {
            Value::Range(r) => out.extend(r.iter()),
            other => out.push(other),
        }
    }
    out
}

/// Collect only the `Number` cells out of `flatten(args)` — the collection
/// rule COUNT, MEDIAN, MODE.SNGL, LARGE, SMALL, and RANK.EQ all share:
/// numeric cells count, everything else (text, booleans, blanks, errors) is
/// silently skipped rather than coerced or propagated.
pub fn collect_numbers(args: &[Value]) -> Vec<f64> {
    flatten(args)
        .into_iter()
        .filter_map(|v| match v {
            Value::Number(n) => Some(*n),
            _ => None,
        })
        .collect()
}

/// Coerce to text the way every text-family function does, turning a
/// coercion failure into the `Value::Error` the caller can return directly.
pub fn text_of(v: &Value) -> Result<String, Value> {
    v.to_text().map_err(Value::Error)
}

/// Coerce to a number the same way, for the text functions that take a
/// numeric argument (`LEFT`'s `num_chars`, `REPLACE`'s `start_num`, …).
pub fn number_of(v: &Value) -> Result<f64, Value> {
    v.to_number().map_err(Value::Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::RangeValue;

    #[test]
    fn flatten_expands_ranges_row_major() {
        let range = Value::Range(RangeValue::new(vec![
            vec![Value::Number(1.0), Value::Number(2.0)],
            vec![Value::Number(3.0), Value::Number(4.0)],
        ]));
        let flat = flatten(&[Value::Number(0.0), range]);
        let nums: Vec<f64> = flat.iter().map(|v| v.to_number().unwrap()).collect();
        assert_eq!(nums, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn collect_numbers_skips_non_numeric_cells() {
        let range = Value::Range(RangeValue::new(vec![vec![
            Value::Number(1.0),
            Value::Text("x".into()),
            Value::Empty,
            Value::Boolean(true),
        ]]));
        assert_eq!(collect_numbers(&[range]), vec![1.0]);
    }
}
