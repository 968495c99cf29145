//! The criterion mini-language shared by `COUNTIF`/`SUMIF`/`AVERAGEIF` and
//! their `S`-suffixed multi-criteria siblings.
//!
//! A criterion value is normalised to text, then parsed: an optional
//! comparison-operator prefix (longest match first among `>=`, `<=`, `<>`,
//! `>`, `<`, `=`) followed by the comparand text. Numeric comparison wins
//! whenever both sides parse as numbers; otherwise only `<>`/`=` fall back
//! to case-insensitive text comparison, and every other operator simply
//! fails to match non-numeric data.

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

pub struct Criterion {
    op: Option<Op>,
    comparand: String,
}

impl Criterion {
    pub fn parse(value: &Value) -> Self {
        let text = value.to_text().unwrap_or_default();
        // Longest match first so ">=" isn't mistaken for ">".
        const PREFIXES: [(&str, Op); 6] = [
            (">=", Op::Ge),
            ("<=", Op::Le),
            ("<>", Op::Ne),
            (">", Op::Gt),
            ("<", Op::Lt),
            ("=", Op::Eq),
        ];
        for (prefix, op) in PREFIXES {
            if let Some(rest) = text.strip_prefix(prefix) {
                return Criterion {
                    op: Some(op),
                    comparand: rest.trim().to_string(),
                };
            }
        }
        Criterion {
            op: None,
            comparand: text.trim().to_string(),
        }
    }

    pub fn matches(&self, cell: &Value) -> bool {
        let cell_number = cell.to_number().ok();
        let comparand_number = self.comparand.parse::<f64>().ok();

        match (cell_number, comparand_number) {
            (Some(a), Some(b)) => match self.op {
                Some(Op::Eq) | None => a == b,
                Some(Op::Ne) => a != b,
                Some(Op::Lt) => a < b,
                Some(Op::Le) => a <= b,
                Some(Op::Gt) => a > b,
                Some(Op::Ge) => a >= b,
            },
            _ => match self.op {
                Some(Op::Eq) => text_eq(cell, &self.comparand),
                Some(Op::Ne) => !text_eq(cell, &self.comparand),
                None => text_eq(cell, &self.comparand),
                _ => false,
            },
        }
    }
}

fn text_eq(cell: &Value, comparand: &str) -> bool {
    cell.to_text()
        .map(|t| t.eq_ignore_ascii_case(comparand))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_comparison_with_operator_prefix() {
        let crit = Criterion::parse(&Value::Text(">2".into()));
        assert!(!crit.matches(&Value::Number(2.0)));
        assert!(crit.matches(&Value::Number(3.0)));
    }

    #[test]
    fn bare_number_criterion_is_numeric_equality() {
        let crit = Criterion::parse(&Value::Number(5.0));
        assert!(crit.matches(&Value::Number(5.0)));
        assert!(!crit.matches(&Value::Number(6.0)));
    }

    #[test]
    fn text_equality_is_case_insensitive() {
        let crit = Criterion::parse(&Value::Text("Apple".into()));
        assert!(crit.matches(&Value::Text("APPLE".into())));
        assert!(!crit.matches(&Value::Text("Banana".into())));
    }

    #[test]
    fn not_equal_operator_on_text() {
        let crit = Criterion::parse(&Value::Text("<>apple".into()));
        assert!(!crit.matches(&Value::Text("Apple".into())));
        assert!(crit.matches(&Value::Text("Banana".into())));
    }

    #[test]
    fn relational_operator_never_matches_non_numeric_text() {
        let crit = Criterion::parse(&Value::Text(">apple".into()));
        assert!(!crit.matches(&Value::Text("Banana".into())));
    }

    #[test]
    fn criterion_round_trip_matches_countif_semantics() {
        for a in [-3.0, 0.0, 2.5, 10.0] {
            for b in [-1.0, 0.0, 1.0, 5.0] {
                let crit = Criterion::parse(&Value::Text(format!(">{b}")));
                assert_eq!(crit.matches(&Value::Number(a)), a > b);
            }
        }
    }
}
