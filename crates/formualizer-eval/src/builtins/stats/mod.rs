//! The statistical function family: counting, the criteria-matching
//! aggregates (`COUNTIF`/`SUMIF`/`AVERAGEIF` and their `S`-suffixed
//! multi-criteria siblings), and the order-statistics group (`MEDIAN`,
//! `MODE.SNGL`, `LARGE`, `SMALL`, `RANK.EQ`).

pub mod criteria;

use std::sync::Arc;

use formualizer_common::ExcelErrorKind;

use crate::builtins::util::{collect_numbers, flatten};
use crate::context::EvalContext;
use crate::function::Function;
use crate::registry::FunctionRegistry;
use crate::value::Value;
use criteria::Criterion;

fn value_error(msg: impl Into<String>) -> Value {
    Value::error(ExcelErrorKind::Value, msg)
}

/// `COUNT(vs…)` — counts only actual `Number` cells; text never coerces,
/// unlike the arithmetic operators.
pub struct CountFn;

impl Function for CountFn {
    fn name(&self) -> &'static str {
        "COUNT"
    }

    fn call_eager(
        &self,
        args: &[Value],
        _ctx: &Arc<dyn EvalContext>,
        _depth: usize,
    ) -> Value {
        Value::Number(collect_numbers(args).len() as f64)
    }
}

/// `COUNTA(vs…)` — counts every non-`Empty` cell, Ranges included.
pub struct CountAFn;

impl Function for CountAFn {
    fn name(&self) -> &'static str {
        "COUNTA"
    }

    fn call_eager(
        &self,
        args: &[Value],
        _ctx: &Arc<dyn EvalContext>,
        _depth: usize,
    ) -> Value {
        let count = flatten(args)
            .into_iter()
            .filter(|v| !matches!(v, Value::Empty))
            .count();
        Value::Number(count as f64)
    }
}

/// `COUNTBLANK(v)` — a single Range counts its `Empty` cells; a scalar is
/// `1` if it's `Empty`, else `0`.
pub struct CountBlankFn;

impl Function for CountBlankFn {
    fn name(&self) -> &'static str {
        "COUNTBLANK"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn call_eager(
        &self,
        args: &[Value],
        _ctx: &Arc<dyn EvalContext>,
        _depth: usize,
    ) -> Value {
        match &args[0] {
            Value::Range(r) => {
                Value::Number(r.iter().filter(|v| matches!(v, Value::Empty)).count() as f64)
            }
            Value::Empty => Value::Number(1.0),
            _ => Value::Number(0.0),
        }
    }
}

/// `COUNTIF(range, criterion)`.
pub struct CountIfFn;

impl Function for CountIfFn {
    fn name(&self) -> &'static str {
        "COUNTIF"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn call_eager(
        &self,
        args: &[Value],
        _ctx: &Arc<dyn EvalContext>,
        _depth: usize,
    ) -> Value {
        let range = flatten(&args[0..1]);
        let crit = Criterion::parse(&args[1]);
        let count = range.into_iter().filter(|v| crit.matches(v)).count();
        Value::Number(count as f64)
    }
}

/// `SUMIF(range, criterion, [sum_range])`. `range` and `sum_range` are
/// zipped by flattened index, stopping at the shorter of the two; omitting
/// `sum_range` reuses `range`.
pub struct SumIfFn;

impl Function for SumIfFn {
    fn name(&self) -> &'static str {
        "SUMIF"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn call_eager(
        &self,
        args: &[Value],
        _ctx: &Arc<dyn EvalContext>,
        _depth: usize,
    ) -> Value {
        let range = flatten(&args[0..1]);
        let crit = Criterion::parse(&args[1]);
        let sum_range = if args.len() == 3 {
            flatten(&args[2..3])
        } else {
            range.clone()
        };
        let n = range.len().min(sum_range.len());
        let mut total = 0.0;
        for i in 0..n {
            if crit.matches(range[i]) {
                match sum_range[i].to_number() {
                    Ok(x) => total += x,
                    Err(e) => return Value::Error(e),
                }
            }
        }
        Value::Number(total)
    }
}

/// `AVERAGEIF(range, criterion, [avg_range])`. Zero matches is `#DIV/0!`.
pub struct AverageIfFn;

impl Function for AverageIfFn {
    fn name(&self) -> &'static str {
        "AVERAGEIF"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn call_eager(
        &self,
        args: &[Value],
        _ctx: &Arc<dyn EvalContext>,
        _depth: usize,
    ) -> Value {
        let range = flatten(&args[0..1]);
        let crit = Criterion::parse(&args[1]);
        let avg_range = if args.len() == 3 {
            flatten(&args[2..3])
        } else {
            range.clone()
        };
        let n = range.len().min(avg_range.len());
        let mut total = 0.0;
        let mut matches = 0usize;
        for i in 0..n {
            if crit.matches(range[i]) {
                match avg_range[i].to_number() {
                    Ok(x) => {
                        total += x;
                        matches += 1;
                    }
                    Err(e) => return Value::Error(e),
                }
            }
        }
        if matches == 0 {
            Value::error(ExcelErrorKind::Div, "AVERAGEIF: no matching rows")
        } else {
            Value::Number(total / matches as f64)
        }
    }
}

/// Parse the repeated `(range, criterion)` tail shared by the `S`-suffixed
/// multi-criteria aggregates.
fn parse_pairs(args: &[Value]) -> Vec<(Vec<&Value>, Criterion)> {
    args.chunks(2)
        .map(|pair| (flatten(&pair[0..1]), Criterion::parse(&pair[1])))
        .collect()
}

fn row_matches(i: usize, pairs: &[(Vec<&Value>, Criterion)]) -> bool {
    pairs
        .iter()
        .all(|(range, crit)| i < range.len() && crit.matches(range[i]))
}

/// `SUMIFS(sum_range, range1, criterion1, …)` — a leading target range
/// followed by `(range, criterion)` pairs; every pair must match for a row
/// to contribute. An out-of-bounds index in any criteria range disqualifies
/// that row rather than erroring.
pub struct SumIfsFn;

impl Function for SumIfsFn {
    fn name(&self) -> &'static str {
        "SUMIFS"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn call_eager(
        &self,
        args: &[Value],
        _ctx: &Arc<dyn EvalContext>,
        _depth: usize,
    ) -> Value {
        if (args.len() - 1) % 2 != 0 {
            return value_error("SUMIFS requires range/criterion pairs after the sum range");
        }
        let sum_range = flatten(&args[0..1]);
        let pairs = parse_pairs(&args[1..]);
        let mut total = 0.0;
        for (i, cell) in sum_range.iter().enumerate() {
            if row_matches(i, &pairs) {
                match cell.to_number() {
                    Ok(x) => total += x,
                    Err(e) => return Value::Error(e),
                }
            }
        }
        Value::Number(total)
    }
}

/// `COUNTIFS(range1, criterion1, …)` — no leading target range, just pairs.
pub struct CountIfsFn;

impl Function for CountIfsFn {
    fn name(&self) -> &'static str {
        "COUNTIFS"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn call_eager(
        &self,
        args: &[Value],
        _ctx: &Arc<dyn EvalContext>,
        _depth: usize,
    ) -> Value {
        if args.len() % 2 != 0 {
            return value_error("COUNTIFS requires range/criterion pairs");
        }
        let pairs = parse_pairs(args);
        let rows = pairs.iter().map(|(r, _)| r.len()).max().unwrap_or(0);
        let count = (0..rows).filter(|&i| row_matches(i, &pairs)).count();
        Value::Number(count as f64)
    }
}

/// `AVERAGEIFS(avg_range, range1, criterion1, …)`. Zero matches is `#DIV/0!`.
pub struct AverageIfsFn;

impl Function for AverageIfsFn {
    fn name(&self) -> &'static str {
        "AVERAGEIFS"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn call_eager(
        &self,
        args: &[Value],
        _ctx: &Arc<dyn EvalContext>,
        _depth: usize,
    ) -> Value {
        if (args.len() - 1) % 2 != 0 {
            return value_error("AVERAGEIFS requires range/criterion pairs after the average range");
        }
        let avg_range = flatten(&args[0..1]);
        let pairs = parse_pairs(&args[1..]);
        let mut total = 0.0;
        let mut matches = 0usize;
        for (i, cell) in avg_range.iter().enumerate() {
            if row_matches(i, &pairs) {
                match cell.to_number() {
                    Ok(x) => {
                        total += x;
                        matches += 1;
                    }
                    Err(e) => return Value::Error(e),
                }
            }
        }
        if matches == 0 {
            Value::error(ExcelErrorKind::Div, "AVERAGEIFS: no matching rows")
        } else {
            Value::Number(total / matches as f64)
        }
    }
}

/// `MEDIAN(vs…)` — empty numeric collection is `#NUM!`.
pub struct MedianFn;

impl Function for MedianFn {
    fn name(&self) -> &'static str {
        "MEDIAN"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn call_eager(
        &self,
        args: &[Value],
        _ctx: &Arc<dyn EvalContext>,
        _depth: usize,
    ) -> Value {
        let mut nums = collect_numbers(args);
        if nums.is_empty() {
            return Value::error(ExcelErrorKind::Num, "MEDIAN: no numeric values");
        }
        nums.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let n = nums.len();
        let mid = n / 2;
        let median = if n % 2 == 1 {
            nums[mid]
        } else {
            (nums[mid - 1] + nums[mid]) / 2.0
        };
        Value::Number(median)
    }
}

/// `MODE.SNGL(vs…)` — the smallest-valued number among those tied for the
/// highest repeat count (strictly `>1`); `#N/A` if nothing repeats. The
/// source's own hash-iteration-order pick is non-deterministic among ties;
/// we document the smallest-value tie-break as our deterministic choice
/// (see DESIGN.md).
pub struct ModeSnglFn;

impl Function for ModeSnglFn {
    fn name(&self) -> &'static str {
        "MODE.SNGL"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn call_eager(
        &self,
        args: &[Value],
        _ctx: &Arc<dyn EvalContext>,
        _depth: usize,
    ) -> Value {
        let mut nums = collect_numbers(args);
        if nums.is_empty() {
            return Value::error(ExcelErrorKind::Na, "MODE: no numeric values");
        }
        nums.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mut best_val = nums[0];
        let mut best_cnt = 1usize;
        let mut cur_val = nums[0];
        let mut cur_cnt = 1usize;
        for &v in &nums[1..] {
            if v == cur_val {
                cur_cnt += 1;
            } else {
                if cur_cnt > best_cnt {
                    best_cnt = cur_cnt;
                    best_val = cur_val;
                }
                cur_val = v;
                cur_cnt = 1;
            }
        }
        if cur_cnt > best_cnt {
            best_cnt = cur_cnt;
            best_val = cur_val;
        }
        if best_cnt <= 1 {
            Value::error(ExcelErrorKind::Na, "MODE: no value repeats")
        } else {
            Value::Number(best_val)
        }
    }
}

fn integer_k(v: &Value, n: usize) -> Result<usize, Value> {
    let k = v.to_number().map_err(Value::Error)?;
    if k.trunc() != k || k < 1.0 || k as usize > n {
        return Err(Value::error(ExcelErrorKind::Num, "k out of range"));
    }
    Ok(k as usize)
}

/// `LARGE(array, k)` — the k-th largest; ties are not compressed.
pub struct LargeFn;

impl Function for LargeFn {
    fn name(&self) -> &'static str {
        "LARGE"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn call_eager(
        &self,
        args: &[Value],
        _ctx: &Arc<dyn EvalContext>,
        _depth: usize,
    ) -> Value {
        let mut nums = collect_numbers(&args[0..1]);
        let k = match integer_k(&args[1], nums.len()) {
            Ok(k) => k,
            Err(e) => return e,
        };
        nums.sort_by(|a, b| b.partial_cmp(a).unwrap());
        Value::Number(nums[k - 1])
    }
}

/// `SMALL(array, k)` — the k-th smallest.
pub struct SmallFn;

impl Function for SmallFn {
    fn name(&self) -> &'static str {
        "SMALL"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn call_eager(
        &self,
        args: &[Value],
        _ctx: &Arc<dyn EvalContext>,
        _depth: usize,
    ) -> Value {
        let mut nums = collect_numbers(&args[0..1]);
        let k = match integer_k(&args[1], nums.len()) {
            Ok(k) => k,
            Err(e) => return e,
        };
        nums.sort_by(|a, b| a.partial_cmp(b).unwrap());
        Value::Number(nums[k - 1])
    }
}

/// `RANK.EQ(number, ref, [order])` — descending by default (ties share the
/// better/lower rank); any nonzero `order` switches to ascending.
pub struct RankEqFn;

impl Function for RankEqFn {
    fn name(&self) -> &'static str {
        "RANK.EQ"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn call_eager(
        &self,
        args: &[Value],
        _ctx: &Arc<dyn EvalContext>,
        _depth: usize,
    ) -> Value {
        let number = match args[0].to_number() {
            Ok(n) => n,
            Err(e) => return Value::Error(e),
        };
        let numbers = collect_numbers(&args[1..2]);
        if !numbers.iter().any(|&n| n == number) {
            return Value::error(ExcelErrorKind::Na, "RANK.EQ: number not found in ref");
        }
        let ascending = if args.len() == 3 {
            match args[2].to_number() {
                Ok(n) => n != 0.0,
                Err(e) => return Value::Error(e),
            }
        } else {
            false
        };
        let rank = if ascending {
            1 + numbers.iter().filter(|&&n| n < number).count()
        } else {
            1 + numbers.iter().filter(|&&n| n > number).count()
        };
        Value::Number(rank as f64)
    }
}

pub fn register_builtins(reg: &mut FunctionRegistry) {
    reg.register(Arc::new(CountFn));
    reg.register(Arc::new(CountAFn));
    reg.register(Arc::new(CountBlankFn));
    reg.register(Arc::new(CountIfFn));
    reg.register(Arc::new(SumIfFn));
    reg.register(Arc::new(AverageIfFn));
    reg.register(Arc::new(SumIfsFn));
    reg.register(Arc::new(CountIfsFn));
    reg.register(Arc::new(AverageIfsFn));
    reg.register(Arc::new(MedianFn));
    reg.register(Arc::new(ModeSnglFn));
    reg.register(Arc::new(LargeFn));
    reg.register(Arc::new(SmallFn));
    reg.register(Arc::new(RankEqFn));

    reg.alias("MODE", "MODE.SNGL");
    reg.alias("RANK", "RANK.EQ");
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
    fn count_ignores_text_and_blanks() {
        let v = eval_str("=COUNT(1,\"x\",2,)");
        assert_eq!(v.to_number().unwrap(), 2.0);
    }

    #[test]
    fn counta_counts_non_empty_cells() {
        let v = eval_str("=COUNTA({1,\"\",2})");
        assert_eq!(v.to_number().unwrap(), 3.0);
    }

    #[test]
    fn countblank_scalar_and_range() {
        assert_eq!(eval_str("=COUNTBLANK({1,2})").to_number().unwrap(), 0.0);
    }

    #[test]
    fn sumif_filters_by_criterion() {
        let v = eval_str("=SUMIF({1,2,3,4},\">2\")");
        assert_eq!(v.to_number().unwrap(), 7.0);
    }

    #[test]
    fn averageif_zero_matches_is_div0() {
        let v = eval_str("=AVERAGEIF({1,2,3},\">10\")");
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Div);
    }

    #[test]
    fn countif_basic() {
        let v = eval_str("=COUNTIF({1,2,3,4},\">2\")");
        assert_eq!(v.to_number().unwrap(), 2.0);
    }

    #[test]
    fn sumifs_requires_every_pair_to_match() {
        let v = eval_str("=SUMIFS({10,20,30},{1,2,3},\">1\",{\"a\",\"b\",\"a\"},\"a\")");
        assert_eq!(v.to_number().unwrap(), 30.0);
    }

    #[test]
    fn countifs_disqualifies_out_of_bounds_rows() {
        let v = eval_str("=COUNTIFS({1,2,3},\">0\",{1,2},\">0\")");
        assert_eq!(v.to_number().unwrap(), 2.0);
    }

    #[test]
    fn median_odd_and_even_counts() {
        assert_eq!(eval_str("=MEDIAN(1,3,2)").to_number().unwrap(), 2.0);
        assert_eq!(eval_str("=MEDIAN(1,2,3,4)").to_number().unwrap(), 2.5);
    }

    #[test]
    fn median_of_nothing_is_num_error() {
        let v = eval_str("=MEDIAN()");
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Num);
    }

    #[test]
    fn mode_sngl_picks_the_repeated_value() {
        let v = eval_str("=MODE.SNGL({1,2,2,3})");
        assert_eq!(v.to_number().unwrap(), 2.0);
    }

    #[test]
    fn mode_with_no_repeats_is_na() {
        let v = eval_str("=MODE({1,2,3})");
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Na);
    }

    #[test]
    fn large_and_small_k_th_order_statistics() {
        assert_eq!(eval_str("=LARGE({4,9,1,7},2)").to_number().unwrap(), 7.0);
        assert_eq!(eval_str("=SMALL({4,9,1,7},2)").to_number().unwrap(), 4.0);
    }

    #[test]
    fn large_rejects_k_out_of_range() {
        let v = eval_str("=LARGE({1,2},5)");
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Num);
    }

    #[test]
    fn rank_eq_descending_ties_share_best_rank() {
        let v = eval_str("=RANK.EQ(5,{5,3,5,1})");
        assert_eq!(v.to_number().unwrap(), 1.0);
    }

    #[test]
    fn rank_eq_missing_number_is_na() {
        let v = eval_str("=RANK.EQ(99,{1,2,3})");
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Na);
    }

    #[test]
    fn rank_alias_matches_rank_eq() {
        let a = eval_str("=RANK(5,{5,3,5,1})");
        let b = eval_str("=RANK.EQ(5,{5,3,5,1})");
        assert_eq!(a.to_number().unwrap(), b.to_number().unwrap());
    }
}
