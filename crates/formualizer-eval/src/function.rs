//! The two calling conventions a builtin can use, and the trait first-class
//! function values (`LAMBDA` closures) implement to be invoked.

use std::sync::Arc;

use formualizer_parse::ASTNode;

use crate::context::EvalContext;
use crate::value::Value;

/// A named builtin. Eager functions receive already-evaluated arguments with
/// the first `Error` short-circuited by the caller; lazy functions receive
/// the raw argument trees and decide for themselves what to evaluate and in
/// what order (`LAMBDA`, `LET`, `MAP`, `REDUCE`, …).
pub trait Function: Send + Sync {
    fn name(&self) -> &'static str;

    fn min_args(&self) -> usize {
        0
    }

    /// `None` means variadic.
    fn max_args(&self) -> Option<usize> {
        None
    }

    fn is_lazy(&self) -> bool {
        false
    }

    fn call_eager(&self, args: &[Value], ctx: &Arc<dyn EvalContext>, depth: usize) -> Value {
        let _ = (args, ctx, depth);
        unreachable!("{} is lazy but call_eager was invoked", self.name())
    }

    fn call_lazy(&self, args: &[ASTNode], ctx: &Arc<dyn EvalContext>, depth: usize) -> Value {
        let _ = (args, ctx, depth);
        unreachable!("{} is eager but call_lazy was invoked", self.name())
    }
}

/// A first-class function value, as produced by `LAMBDA`. Unlike `Function`,
/// a `Callable` carries its own captured context (its defining scope) rather
/// than receiving one from the call site.
pub trait Callable: Send + Sync {
    fn min_args(&self) -> usize;
    fn max_args(&self) -> usize;
    fn invoke(&self, args: Vec<Value>, depth: usize) -> Value;
}

/// Returns `Some(error)` if `count` arguments don't satisfy `[min, max]`.
pub fn check_arity(name: &str, count: usize, min: usize, max: Option<usize>) -> Option<Value> {
    if count < min || max.is_some_and(|m| count > m) {
        Some(Value::error(
            formualizer_common::ExcelErrorKind::Value,
            format!("{name}: expected {}..{} arguments, got {count}", min, max.map(|m| m.to_string()).unwrap_or_else(|| "∞".into())),
        ))
    } else {
        None
    }
}
