//! `LAMBDA`, `LET`, and the array combinators built on first-class function
//! values (`MAP`, `REDUCE`, `SCAN`, `MAKEARRAY`, `BYROW`, `BYCOL`), plus
//! `ISOMITTED`.
//!
//! All but `ISOMITTED` are lazy: `LAMBDA`/`LET` because they control
//! whether and when their arguments run at all (a `LET` name is never
//! evaluated; a `LAMBDA` body may run zero, one, or many times); the array
//! combinators because they still take raw argument nodes so the per-call
//! evaluator doesn't short-circuit the whole call on an upstream Error
//! before the combinator gets a chance to report it against the right
//! argument position — in practice each evaluates its array and function
//! arguments immediately, left to right, exactly as an eager call would.

use std::sync::Arc;

use formualizer_common::ExcelErrorKind;
use formualizer_parse::{ASTNode, ASTNodeType, ReferenceType};

use crate::context::{EvalContext, ScopedContext};
use crate::function::{Callable, Function};
use crate::interpreter::evaluate_at;
use crate::registry::FunctionRegistry;
use crate::value::{RangeValue, Value};

/// A bare identifier parses as a bound-to-nothing `NamedRange` reference —
/// that's how `LET`/`LAMBDA` parameter and binding names show up in the
/// parsed tree, since the grammar has no dedicated "name" node.
fn param_name(node: &ASTNode) -> Option<&str> {
    match &node.node_type {
        ASTNodeType::Reference {
            reference: ReferenceType::NamedRange(name),
            ..
        } => Some(name.as_str()),
        _ => None,
    }
}

fn value_error(msg: impl Into<String>) -> Value {
    Value::error(ExcelErrorKind::Value, msg)
}

/// Evaluate `node` and bail out early (returning the Error as-is) if it
/// yields one. Lazy functions that evaluate their own arguments use this in
/// place of the automatic short-circuit the eager path gets for free.
macro_rules! eval_or_return {
    ($node:expr, $ctx:expr, $depth:expr) => {{
        let v = evaluate_at($node, $ctx, $depth);
        if let Value::Error(e) = v {
            return Value::Error(e);
        }
        v
    }};
}

pub struct LambdaClosure {
    param_names: Vec<String>,
    body: ASTNode,
    captured: Arc<dyn EvalContext>,
}

impl Callable for LambdaClosure {
    fn min_args(&self) -> usize {
        0
    }

    fn max_args(&self) -> usize {
        self.param_names.len()
    }

    fn invoke(&self, args: Vec<Value>, depth: usize) -> Value {
        if args.len() > self.param_names.len() {
            return value_error(format!(
                "lambda expects at most {} argument(s), got {}",
                self.param_names.len(),
                args.len()
            ));
        }
        let mut args = args.into_iter();
        let mut scope = ScopedContext::new(self.captured.clone());
        for name in &self.param_names {
            scope.bind(name.clone(), args.next().unwrap_or(Value::Omitted));
        }
        let ctx: Arc<dyn EvalContext> = Arc::new(scope);
        evaluate_at(&self.body, &ctx, depth)
    }
}

pub struct LambdaFn;

impl Function for LambdaFn {
    fn name(&self) -> &'static str {
        "LAMBDA"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        None
    }

    fn is_lazy(&self) -> bool {
        true
    }

    /// With a single argument, returns a zero-parameter Function evaluating
    /// it in the capture context; with more, every argument but the last
    /// must be a bare identifier naming a parameter.
    fn call_lazy(&self, args: &[ASTNode], ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        let (params, body) = args.split_at(args.len() - 1);
        let mut names = Vec::with_capacity(params.len());
        for p in params {
            match param_name(p) {
                Some(name) => {
                    if names.iter().any(|n: &String| n.eq_ignore_ascii_case(name)) {
                        return value_error(format!("duplicate lambda parameter: {name}"));
                    }
                    names.push(name.to_string());
                }
                None => return value_error("lambda parameters must be plain names"),
            }
        }
        Value::Function(Arc::new(LambdaClosure {
            param_names: names,
            body: body[0].clone(),
            captured: ctx.clone(),
        }))
    }
}

pub struct LetFn;

impl Function for LetFn {
    fn name(&self) -> &'static str {
        "LET"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        None
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn call_lazy(&self, args: &[ASTNode], ctx: &Arc<dyn EvalContext>, depth: usize) -> Value {
        if args.len() % 2 == 0 {
            return value_error("LET requires name/value pairs followed by a final body");
        }
        let pair_count = (args.len() - 1) / 2;
        let mut current: Arc<dyn EvalContext> = ctx.clone();
        for i in 0..pair_count {
            let name = match param_name(&args[2 * i]) {
                Some(n) => n.to_string(),
                None => return value_error("LET binding names must be plain names"),
            };
            let value = eval_or_return!(&args[2 * i + 1], &current, depth + 1);
            let mut scope = ScopedContext::new(current.clone());
            scope.bind(name, value);
            current = Arc::new(scope);
        }
        evaluate_at(&args[args.len() - 1], &current, depth + 1)
    }
}

pub struct IsOmittedFn;

impl Function for IsOmittedFn {
    fn name(&self) -> &'static str {
        "ISOMITTED"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn call_eager(&self, args: &[Value], _ctx: &Arc<dyn EvalContext>, _depth: usize) -> Value {
        Value::Boolean(matches!(args[0], Value::Omitted))
    }
}

fn as_grid(v: &Value) -> Vec<Vec<Value>> {
    match v {
        Value::Range(r) => r.as_slice().to_vec(),
        other => vec![vec![other.clone()]],
    }
}

fn as_callable(v: Value, fn_name: &str) -> Result<Arc<dyn Callable>, Value> {
    match v {
        Value::Function(c) => Ok(c),
        _ => Err(value_error(format!("{fn_name}: last argument must be a LAMBDA"))),
    }
}

fn invoke_checked(
    callable: &Arc<dyn Callable>,
    args: Vec<Value>,
    depth: usize,
    fn_name: &str,
) -> Value {
    let n = args.len();
    if n < callable.min_args() || n > callable.max_args() {
        return value_error(format!(
            "{fn_name}: lambda expects {}..{} argument(s), got {n}",
            callable.min_args(),
            callable.max_args()
        ));
    }
    callable.invoke(args, depth)
}

pub struct MapFn;

impl Function for MapFn {
    fn name(&self) -> &'static str {
        "MAP"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn call_lazy(&self, args: &[ASTNode], ctx: &Arc<dyn EvalContext>, depth: usize) -> Value {
        let array = eval_or_return!(&args[0], ctx, depth);
        let lambda = eval_or_return!(&args[1], ctx, depth);
        let callable = match as_callable(lambda, "MAP") {
            Ok(c) => c,
            Err(e) => return e,
        };
        let grid = as_grid(&array);
        let mut out = Vec::with_capacity(grid.len());
        for row in &grid {
            if ctx.is_cancelled() {
                return Value::error(ExcelErrorKind::Na, "evaluation cancelled");
            }
            let mut out_row = Vec::with_capacity(row.len());
            for cell in row {
                let result = invoke_checked(&callable, vec![cell.clone()], depth, "MAP");
                if result.is_error() {
                    return result;
                }
                out_row.push(result);
            }
            out.push(out_row);
        }
        Value::Range(RangeValue::new(out))
    }
}

pub struct ReduceFn;

impl Function for ReduceFn {
    fn name(&self) -> &'static str {
        "REDUCE"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn call_lazy(&self, args: &[ASTNode], ctx: &Arc<dyn EvalContext>, depth: usize) -> Value {
        let init = eval_or_return!(&args[0], ctx, depth);
        let array = eval_or_return!(&args[1], ctx, depth);
        let lambda = eval_or_return!(&args[2], ctx, depth);
        let callable = match as_callable(lambda, "REDUCE") {
            Ok(c) => c,
            Err(e) => return e,
        };
        let grid = as_grid(&array);
        let mut acc = init;
        for row in &grid {
            if ctx.is_cancelled() {
                return Value::error(ExcelErrorKind::Na, "evaluation cancelled");
            }
            for cell in row {
                acc = invoke_checked(&callable, vec![acc, cell.clone()], depth, "REDUCE");
                if acc.is_error() {
                    return acc;
                }
            }
        }
        acc
    }
}

pub struct ScanFn;

impl Function for ScanFn {
    fn name(&self) -> &'static str {
        "SCAN"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn call_lazy(&self, args: &[ASTNode], ctx: &Arc<dyn EvalContext>, depth: usize) -> Value {
        let init = eval_or_return!(&args[0], ctx, depth);
        let array = eval_or_return!(&args[1], ctx, depth);
        let lambda = eval_or_return!(&args[2], ctx, depth);
        let callable = match as_callable(lambda, "SCAN") {
            Ok(c) => c,
            Err(e) => return e,
        };
        let grid = as_grid(&array);
        let mut acc = init;
        let mut out = Vec::with_capacity(grid.len());
        for row in &grid {
            if ctx.is_cancelled() {
                return Value::error(ExcelErrorKind::Na, "evaluation cancelled");
            }
            let mut out_row = Vec::with_capacity(row.len());
            for cell in row {
                acc = invoke_checked(&callable, vec![acc, cell.clone()], depth, "SCAN");
                if acc.is_error() {
                    return acc;
                }
                out_row.push(acc.clone());
            }
            out.push(out_row);
        }
        Value::Range(RangeValue::new(out))
    }
}

pub struct MakeArrayFn;

impl Function for MakeArrayFn {
    fn name(&self) -> &'static str {
        "MAKEARRAY"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn call_lazy(&self, args: &[ASTNode], ctx: &Arc<dyn EvalContext>, depth: usize) -> Value {
        let rows_v = eval_or_return!(&args[0], ctx, depth);
        let cols_v = eval_or_return!(&args[1], ctx, depth);
        let lambda = eval_or_return!(&args[2], ctx, depth);

        let rows = match rows_v.to_number() {
            Ok(n) if n >= 1.0 => n.trunc() as usize,
            Ok(_) => return Value::error(ExcelErrorKind::Num, "MAKEARRAY: rows must be >= 1"),
            Err(e) => return Value::Error(e),
        };
        let cols = match cols_v.to_number() {
            Ok(n) if n >= 1.0 => n.trunc() as usize,
            Ok(_) => return Value::error(ExcelErrorKind::Num, "MAKEARRAY: cols must be >= 1"),
            Err(e) => return Value::Error(e),
        };
        let callable = match as_callable(lambda, "MAKEARRAY") {
            Ok(c) => c,
            Err(e) => return e,
        };

        let mut out = Vec::with_capacity(rows);
        for r in 1..=rows {
            if ctx.is_cancelled() {
                return Value::error(ExcelErrorKind::Na, "evaluation cancelled");
            }
            let mut out_row = Vec::with_capacity(cols);
            for c in 1..=cols {
                let result = invoke_checked(
                    &callable,
                    vec![Value::Number(r as f64), Value::Number(c as f64)],
                    depth,
                    "MAKEARRAY",
                );
                if result.is_error() {
                    return result;
                }
                out_row.push(result);
            }
            out.push(out_row);
        }
        Value::Range(RangeValue::new(out))
    }
}

pub struct ByRowFn;

impl Function for ByRowFn {
    fn name(&self) -> &'static str {
        "BYROW"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn call_lazy(&self, args: &[ASTNode], ctx: &Arc<dyn EvalContext>, depth: usize) -> Value {
        let array = eval_or_return!(&args[0], ctx, depth);
        let lambda = eval_or_return!(&args[1], ctx, depth);
        let callable = match as_callable(lambda, "BYROW") {
            Ok(c) => c,
            Err(e) => return e,
        };
        let grid = as_grid(&array);
        if grid.is_empty() || grid.first().is_some_and(|r| r.is_empty()) {
            return value_error("BYROW: array must not be empty");
        }
        let mut out = Vec::with_capacity(grid.len());
        for row in &grid {
            if ctx.is_cancelled() {
                return Value::error(ExcelErrorKind::Na, "evaluation cancelled");
            }
            let row_value = Value::Range(RangeValue::new(vec![row.clone()]));
            let result = invoke_checked(&callable, vec![row_value], depth, "BYROW");
            if result.is_error() {
                return result;
            }
            out.push(vec![result]);
        }
        Value::Range(RangeValue::new(out))
    }
}

pub struct ByColFn;

impl Function for ByColFn {
    fn name(&self) -> &'static str {
        "BYCOL"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn call_lazy(&self, args: &[ASTNode], ctx: &Arc<dyn EvalContext>, depth: usize) -> Value {
        let array = eval_or_return!(&args[0], ctx, depth);
        let lambda = eval_or_return!(&args[1], ctx, depth);
        let callable = match as_callable(lambda, "BYCOL") {
            Ok(c) => c,
            Err(e) => return e,
        };
        let grid = as_grid(&array);
        let cols = grid.first().map_or(0, |r| r.len());
        if grid.is_empty() || cols == 0 {
            return value_error("BYCOL: array must not be empty");
        }
        let mut out_row = Vec::with_capacity(cols);
        for c in 0..cols {
            if ctx.is_cancelled() {
                return Value::error(ExcelErrorKind::Na, "evaluation cancelled");
            }
            let col_value = Value::Range(RangeValue::new(
                grid.iter().map(|row| vec![row[c].clone()]).collect(),
            ));
            let result = invoke_checked(&callable, vec![col_value], depth, "BYCOL");
            if result.is_error() {
                return result;
            }
            out_row.push(result);
        }
        Value::Range(RangeValue::new(vec![out_row]))
    }
}

pub fn register_builtins(reg: &mut FunctionRegistry) {
    reg.register(Arc::new(LambdaFn));
    reg.register(Arc::new(LetFn));
    reg.register(Arc::new(IsOmittedFn));
    reg.register(Arc::new(MapFn));
    reg.register(Arc::new(ReduceFn));
    reg.register(Arc::new(ScanFn));
    reg.register(Arc::new(MakeArrayFn));
    reg.register(Arc::new(ByRowFn));
    reg.register(Arc::new(ByColFn));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::evaluate;
    use crate::test_workbook::TestWorkbook;
    use formualizer_parse::parse;

    fn eval_str(formula: &str) -> Value {
        let ast = parse(formula).expect("parses");
        let ctx = TestWorkbook::new().into_ctx();
        evaluate(&ast, &ctx)
    }

    #[test]
    fn let_binds_values() {
        let v = eval_str("=LET(x, 5, y, 10, x + y)");
        assert_eq!(v.to_number().unwrap(), 15.0);
    }

    #[test]
    fn let_nested_bindings_see_earlier_ones() {
        let v = eval_str("=LET(x, 5, y, x * 2, x + y)");
        assert_eq!(v.to_number().unwrap(), 15.0);
    }

    #[test]
    fn let_scenario_from_the_property_suite() {
        let v = eval_str("=LET(x, 2, y, x*x, y+1)");
        assert_eq!(v.to_number().unwrap(), 5.0);
    }

    #[test]
    fn let_shadowing_uses_innermost_binding() {
        let v = eval_str("=LET(x, 1, LET(x, 2, x))");
        assert_eq!(v.to_number().unwrap(), 2.0);
    }

    #[test]
    fn let_rejects_even_argument_count() {
        let v = eval_str("=LET(x, 5, x + 1, 2)");
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Value);
    }

    #[test]
    fn lambda_invoked_via_let_bound_name() {
        let v = eval_str("=LET(f, LAMBDA(x, x + 1), f(41))");
        assert_eq!(v.to_number().unwrap(), 42.0);
    }

    #[test]
    fn lambda_closure_captures_outer_let_binding() {
        let v = eval_str("=LET(k, 10, f, LAMBDA(x, x + k), f(5))");
        assert_eq!(v.to_number().unwrap(), 15.0);
    }

    #[test]
    fn lambda_rejects_duplicate_parameter_names() {
        let v = eval_str("=LAMBDA(x, x, x + 1)");
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Value);
    }

    #[test]
    fn lambda_value_without_invocation_is_a_function() {
        let v = eval_str("=LET(f, LAMBDA(x, x), 1)");
        assert_eq!(v.to_number().unwrap(), 1.0);
    }

    #[test]
    fn isomitted_detects_missing_trailing_argument() {
        let v = eval_str("=LET(f, LAMBDA(x, y, ISOMITTED(y)), f(1))");
        assert!(v.is_truthy());
        let v2 = eval_str("=LET(f, LAMBDA(x, y, ISOMITTED(y)), f(1, 2))");
        assert!(!v2.is_truthy());
    }

    #[test]
    fn map_applies_lambda_elementwise_over_a_2d_array() {
        let v = eval_str("=MAP({1,2;3,4}, LAMBDA(v, v * 10))");
        match v {
            Value::Range(r) => {
                assert_eq!(r.get(0, 0).unwrap().to_number().unwrap(), 10.0);
                assert_eq!(r.get(0, 1).unwrap().to_number().unwrap(), 20.0);
                assert_eq!(r.get(1, 0).unwrap().to_number().unwrap(), 30.0);
                assert_eq!(r.get(1, 1).unwrap().to_number().unwrap(), 40.0);
            }
            other => panic!("expected range, got {other:?}"),
        }
    }

    #[test]
    fn map_of_a_scalar_is_a_1x1_range() {
        let v = eval_str("=MAP(3, LAMBDA(v, v + 1))");
        match v {
            Value::Range(r) => {
                assert_eq!(r.rows(), 1);
                assert_eq!(r.cols(), 1);
                assert_eq!(r.get(0, 0).unwrap().to_number().unwrap(), 4.0);
            }
            other => panic!("expected range, got {other:?}"),
        }
    }

    #[test]
    fn reduce_accumulates_over_array() {
        let v = eval_str("=REDUCE(0, {1,2,3,4}, LAMBDA(acc, x, acc + x))");
        assert_eq!(v.to_number().unwrap(), 10.0);
    }

    #[test]
    fn scan_returns_running_totals_matching_reduce_final_value() {
        let reduced = eval_str("=REDUCE(0, {1,2,3}, LAMBDA(acc, x, acc + x))");
        let scanned = eval_str("=SCAN(0, {1,2,3}, LAMBDA(acc, x, acc + x))");
        match scanned {
            Value::Range(r) => {
                let vals: Vec<f64> = r.iter().map(|v| v.to_number().unwrap()).collect();
                assert_eq!(vals, vec![1.0, 3.0, 6.0]);
                assert_eq!(*vals.last().unwrap(), reduced.to_number().unwrap());
            }
            other => panic!("expected range, got {other:?}"),
        }
    }

    #[test]
    fn makearray_builds_grid_from_1_indexed_coordinates() {
        let v = eval_str("=MAKEARRAY(2,3,LAMBDA(r,c,(r-1)*3+c))");
        match v {
            Value::Range(r) => {
                let flat: Vec<f64> = r.iter().map(|v| v.to_number().unwrap()).collect();
                assert_eq!(flat, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
            }
            other => panic!("expected range, got {other:?}"),
        }
    }

    #[test]
    fn makearray_rejects_non_positive_dimensions() {
        let v = eval_str("=MAKEARRAY(0,2,LAMBDA(r,c,r))");
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Num);
    }

    #[test]
    fn byrow_reduces_each_row_to_a_single_column() {
        let v = eval_str("=BYROW({1,2;3,4}, LAMBDA(row, REDUCE(0, row, LAMBDA(acc, v, acc + v))))");
        match v {
            Value::Range(r) => {
                assert_eq!(r.rows(), 2);
                assert_eq!(r.cols(), 1);
                assert_eq!(r.get(0, 0).unwrap().to_number().unwrap(), 3.0);
                assert_eq!(r.get(1, 0).unwrap().to_number().unwrap(), 7.0);
            }
            other => panic!("expected range, got {other:?}"),
        }
    }

    #[test]
    fn bycol_reduces_each_column_to_a_single_row() {
        let v = eval_str("=BYCOL({1,2;3,4}, LAMBDA(col, REDUCE(0, col, LAMBDA(acc, v, acc + v))))");
        match v {
            Value::Range(r) => {
                assert_eq!(r.rows(), 1);
                assert_eq!(r.cols(), 2);
                assert_eq!(r.get(0, 0).unwrap().to_number().unwrap(), 4.0);
                assert_eq!(r.get(0, 1).unwrap().to_number().unwrap(), 6.0);
            }
            other => panic!("expected range, got {other:?}"),
        }
    }

    #[test]
    fn named_lambda_resolved_from_the_workbook_like_a_name_manager_entry() {
        // A LAMBDA doesn't have to be created inline: a workbook can expose
        // one as a named range, and calls against that name route through
        // the same "variable holding a Function value" path LET uses.
        // `set_named_range` after wrapping in `Arc` is what lets a name
        // resolve to a closure that (if it referenced its own name) could
        // recurse, the same role Excel's Name Manager plays.
        let wb = Arc::new(TestWorkbook::new());
        let base: Arc<dyn EvalContext> = wb.clone();
        let lambda_ast = parse("=LAMBDA(x, x * x)").expect("parses");
        let args = match &lambda_ast.node_type {
            ASTNodeType::Function { args, .. } => args.clone(),
            _ => unreachable!(),
        };
        let closure = LambdaFn.call_lazy(&args, &base, 0);
        wb.set_named_range("SQUARE", closure);
        let call = parse("=SQUARE(6)").expect("parses");
        let result = evaluate(&call, &base);
        assert_eq!(result.to_number().unwrap(), 36.0);
    }
}
