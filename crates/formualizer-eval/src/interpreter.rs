//! Recursive tree-walking evaluator: turns a parsed `ASTNode` plus an
//! `EvalContext` into a `Value`.

use std::sync::Arc;

use formualizer_common::{ExcelError, ExcelErrorKind};
use formualizer_parse::{ASTNode, ASTNodeType, ReferenceType};

use crate::context::EvalContext;
use crate::reference::{CellRef, Coord, RangeRef};
use crate::value::{RangeValue, Value};

/// Guards against unbounded recursion from user-defined `LAMBDA` calls (the
/// only way a formula tree can recurse — the grammar itself is finite).
/// Chosen to comfortably cover legitimate recursive LAMBDAs (list folds,
/// tree walks over typical sheet-sized data) while failing fast on a
/// mistaken `LAMBDA` that calls itself unconditionally.
pub const MAX_RECURSION_DEPTH: usize = 512;

fn recursion_error() -> Value {
    Value::error(ExcelErrorKind::Num, "recursion depth exceeded")
}

fn cancelled_error() -> Value {
    Value::error(ExcelErrorKind::Na, "evaluation cancelled")
}

/// Evaluate a formula tree from the top.
pub fn evaluate(node: &ASTNode, ctx: &Arc<dyn EvalContext>) -> Value {
    evaluate_at(node, ctx, 0)
}

/// Evaluate a subtree at a known recursion depth. Builtins that recurse back
/// into the interpreter (`LAMBDA` invocation, `MAP`, `REDUCE`, …) must call
/// this — never `evaluate` — so the depth counter stays accurate.
pub fn evaluate_at(node: &ASTNode, ctx: &Arc<dyn EvalContext>, depth: usize) -> Value {
    if depth > MAX_RECURSION_DEPTH {
        #[cfg(feature = "tracing")]
        tracing::warn!(depth, "recursion depth exceeded");
        return recursion_error();
    }
    if ctx.is_cancelled() {
        #[cfg(feature = "tracing")]
        tracing::debug!("evaluation cancelled mid-tree");
        return cancelled_error();
    }
    match &node.node_type {
        ASTNodeType::Literal(lit) => Value::from(lit.clone()),
        ASTNodeType::Reference { reference, .. } => eval_reference(reference, ctx),
        ASTNodeType::UnaryOp { op, expr } => eval_unary(op, expr, ctx, depth),
        ASTNodeType::BinaryOp { op, left, right } => eval_binary(op, left, right, ctx, depth),
        ASTNodeType::Function { name, args } => eval_call(name, args, ctx, depth),
        ASTNodeType::Array(rows) => eval_array(rows, ctx, depth),
    }
}

fn eval_reference(reference: &ReferenceType, ctx: &Arc<dyn EvalContext>) -> Value {
    match reference {
        ReferenceType::Cell { sheet, row, col } => {
            ctx.get_cell(&CellRef::new(sheet.clone(), *row, *col))
        }
        ReferenceType::Range {
            sheet,
            start_row,
            start_col,
            end_row,
            end_col,
        } => match (start_row, start_col, end_row, end_col) {
            (Some(sr), Some(sc), Some(er), Some(ec)) => ctx.get_range(&RangeRef::new(
                sheet.clone(),
                Coord::new(*sr, *sc),
                Coord::new(*er, *ec),
            )),
            _ => Value::error(ExcelErrorKind::Ref, "whole row/column references are not supported"),
        },
        ReferenceType::Table(_) => {
            Value::error(ExcelErrorKind::Ref, "structured table references are not supported")
        }
        ReferenceType::NamedRange(name) => {
            // Doubles as the lexical-name lookup used by LET/LAMBDA bindings:
            // a bare identifier parses as a NamedRange reference, so a local
            // variable shadows a workbook-level named range of the same
            // name.
            if let Some(v) = ctx.get_variable(name) {
                v
            } else if let Some(v) = ctx.resolve_name(name) {
                v
            } else {
                Value::error(ExcelErrorKind::Name, format!("undefined name: {name}"))
            }
        }
    }
}

fn eval_unary(op: &str, expr: &ASTNode, ctx: &Arc<dyn EvalContext>, depth: usize) -> Value {
    let v = evaluate_at(expr, ctx, depth + 1);
    if let Value::Error(e) = &v {
        return Value::Error(e.clone());
    }
    match op {
        "-" => match v.to_number() {
            Ok(n) => Value::Number(-n),
            Err(e) => Value::Error(e),
        },
        "+" => match v.to_number() {
            Ok(n) => Value::Number(n),
            Err(e) => Value::Error(e),
        },
        "%" => match v.to_number() {
            Ok(n) => Value::Number(n / 100.0),
            Err(e) => Value::Error(e),
        },
        other => Value::error(ExcelErrorKind::Value, format!("unsupported unary operator {other}")),
    }
}

fn eval_binary(
    op: &str,
    left: &ASTNode,
    right: &ASTNode,
    ctx: &Arc<dyn EvalContext>,
    depth: usize,
) -> Value {
    let lv = evaluate_at(left, ctx, depth + 1);
    if let Value::Error(e) = &lv {
        return Value::Error(e.clone());
    }
    let rv = evaluate_at(right, ctx, depth + 1);
    if let Value::Error(e) = &rv {
        return Value::Error(e.clone());
    }

    match op {
        "&" => match (lv.to_text(), rv.to_text()) {
            (Ok(a), Ok(b)) => Value::Text(a + &b),
            (Err(e), _) | (_, Err(e)) => Value::Error(e),
        },
        "+" | "-" | "*" | "/" | "^" => eval_arithmetic(op, &lv, &rv),
        "=" | "<>" | "<" | "<=" | ">" | ">=" => Value::Boolean(eval_compare(op, &lv, &rv)),
        other => Value::error(ExcelErrorKind::Value, format!("unsupported operator {other}")),
    }
}

fn eval_arithmetic(op: &str, lv: &Value, rv: &Value) -> Value {
    let (a, b) = match (lv.to_number(), rv.to_number()) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return Value::Error(e),
    };
    match op {
        "+" => Value::Number(a + b),
        "-" => Value::Number(a - b),
        "*" => Value::Number(a * b),
        "/" => {
            if b == 0.0 {
                Value::error(ExcelErrorKind::Div, "division by zero")
            } else {
                Value::Number(a / b)
            }
        }
        "^" => Value::Number(a.powf(b)),
        _ => unreachable!(),
    }
}

/// Comparison follows Excel's total order across types: numbers < text <
/// booleans, and within a type the natural order; `=`/`<>` additionally
/// compare text case-insensitively.
fn eval_compare(op: &str, lv: &Value, rv: &Value) -> bool {
    use std::cmp::Ordering;

    fn type_rank(v: &Value) -> u8 {
        match v {
            Value::Number(_) | Value::Empty => 0,
            Value::Text(_) => 1,
            Value::Boolean(_) => 2,
            _ => 3,
        }
    }

    let ordering = match (lv, rv) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Value::Empty, Value::Number(b)) => 0.0f64.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Value::Number(a), Value::Empty) => a.partial_cmp(&0.0).unwrap_or(Ordering::Equal),
        (Value::Text(a), Value::Text(b)) => a.to_ascii_uppercase().cmp(&b.to_ascii_uppercase()),
        (Value::Empty, Value::Text(b)) => "".cmp(b.as_str()),
        (Value::Text(a), Value::Empty) => a.as_str().cmp(""),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (Value::Empty, Value::Empty) => Ordering::Equal,
        _ => type_rank(lv).cmp(&type_rank(rv)),
    };

    match op {
        "=" => ordering == Ordering::Equal,
        "<>" => ordering != Ordering::Equal,
        "<" => ordering == Ordering::Less,
        "<=" => ordering != Ordering::Greater,
        ">" => ordering == Ordering::Greater,
        ">=" => ordering != Ordering::Less,
        _ => unreachable!(),
    }
}

fn eval_array(rows: &[Vec<ASTNode>], ctx: &Arc<dyn EvalContext>, depth: usize) -> Value {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut out_row = Vec::with_capacity(row.len());
        for cell in row {
            out_row.push(evaluate_at(cell, ctx, depth + 1));
        }
        out.push(out_row);
    }
    Value::Range(RangeValue::new(out))
}

fn eval_call(name: &str, args: &[ASTNode], ctx: &Arc<dyn EvalContext>, depth: usize) -> Value {
    if let Some(func) = ctx.get_function(name) {
        if let Some(err) =
            crate::function::check_arity(name, args.len(), func.min_args(), func.max_args())
        {
            return err;
        }
        if func.is_lazy() {
            return func.call_lazy(args, ctx, depth + 1);
        }
        let values = match eval_args_eager(args, ctx, depth) {
            Ok(values) => values,
            Err(e) => return Value::Error(e),
        };
        return func.call_eager(&values, ctx, depth + 1);
    }

    // Not a registered function: maybe it's a variable holding a first-class
    // function value, invoked the ordinary call way (`LET(f, LAMBDA(...), f(41))`).
    if let Some(Value::Function(callable)) = ctx.get_variable(name) {
        let values = match eval_args_eager(args, ctx, depth) {
            Ok(values) => values,
            Err(e) => return Value::Error(e),
        };
        let (min, max) = (callable.min_args(), callable.max_args());
        if values.len() < min || values.len() > max {
            return Value::error(
                ExcelErrorKind::Value,
                format!("{name}: expected {min}..{max} arguments, got {}", values.len()),
            );
        }
        return callable.invoke(values, depth + 1);
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(name, "call to unknown function");
    Value::error(ExcelErrorKind::Name, format!("unknown function: {name}"))
}

fn eval_args_eager(
    args: &[ASTNode],
    ctx: &Arc<dyn EvalContext>,
    depth: usize,
) -> Result<Vec<Value>, ExcelError> {
    let mut values = Vec::with_capacity(args.len());
    for a in args {
        let v = evaluate_at(a, ctx, depth + 1);
        if let Value::Error(e) = v {
            return Err(e);
        }
        values.push(v);
    }
    Ok(values)
}
