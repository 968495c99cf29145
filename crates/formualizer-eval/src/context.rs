//! The evaluation context: everything an AST needs resolved out-of-band —
//! cell and range data, the function registry, and lexical variable lookup.
//!
//! Contexts are always handed around as `Arc<dyn EvalContext>` rather than
//! borrowed references. A `LAMBDA` closure captures the `Arc` it was created
//! under, so it can outlive the single evaluation call that produced it —
//! something a borrowed `&dyn EvalContext` couldn't express without unsafe
//! lifetime games.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::function::Function;
use crate::reference::{CellRef, RangeRef};
use crate::value::Value;

/// Everything a formula tree needs from the outside world.
pub trait EvalContext: Send + Sync {
    /// Resolve a single cell reference to its current value.
    fn get_cell(&self, cell: &CellRef) -> Value;

    /// Resolve a range reference to a `Value::Range`.
    fn get_range(&self, range: &RangeRef) -> Value;

    /// Look up a builtin (or user-registered) function by name, case-insensitively.
    fn get_function(&self, name: &str) -> Option<Arc<dyn Function>>;

    /// Look up a lexical variable (a `LET`/`LAMBDA` binding). Contexts with
    /// no scoping of their own (the workbook-level context) simply return
    /// `None`, deferring to `resolve_name` for workbook named ranges.
    fn get_variable(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Look up a workbook-level named range, distinct from a lexical binding.
    fn resolve_name(&self, _name: &str) -> Option<Value> {
        None
    }

    /// The cell this formula is anchored to, if any (used by volatile/
    /// position-sensitive functions; unused by the spec's function families
    /// but kept as part of the ambient interface).
    fn current_cell(&self) -> Option<CellRef> {
        None
    }

    /// Cooperative cancellation: checked at loop boundaries inside
    /// higher-order builtins (`MAP`, `REDUCE`, `SCAN`, …) and at each
    /// recursive descent into a subtree.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A lexical scope: a local name-to-value overlay in front of a parent
/// context. `LET` pushes one binding at a time (later bindings can reference
/// earlier ones in the same `LET`); `LAMBDA` invocation pushes one scope
/// binding every parameter at once.
pub struct ScopedContext {
    parent: Arc<dyn EvalContext>,
    locals: FxHashMap<String, Value>,
}

impl ScopedContext {
    pub fn new(parent: Arc<dyn EvalContext>) -> Self {
        Self {
            parent,
            locals: FxHashMap::default(),
        }
    }

    /// Build a scope with `names` bound to `values` in order. Panics if the
    /// slices differ in length — callers are expected to have already
    /// arity-checked.
    pub fn with_bindings<I>(parent: Arc<dyn EvalContext>, bindings: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut ctx = Self::new(parent);
        for (name, value) in bindings {
            ctx.bind(name, value);
        }
        ctx
    }

    pub fn bind(&mut self, name: String, value: Value) {
        self.locals.insert(name.to_ascii_uppercase(), value);
    }

    pub fn parent(&self) -> &Arc<dyn EvalContext> {
        &self.parent
    }
}

impl EvalContext for ScopedContext {
    fn get_cell(&self, cell: &CellRef) -> Value {
        self.parent.get_cell(cell)
    }

    fn get_range(&self, range: &RangeRef) -> Value {
        self.parent.get_range(range)
    }

    fn get_function(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.parent.get_function(name)
    }

    fn get_variable(&self, name: &str) -> Option<Value> {
        let key = name.to_ascii_uppercase();
        self.locals
            .get(&key)
            .cloned()
            .or_else(|| self.parent.get_variable(name))
    }

    fn resolve_name(&self, name: &str) -> Option<Value> {
        self.parent.resolve_name(name)
    }

    fn current_cell(&self) -> Option<CellRef> {
        self.parent.current_cell()
    }

    fn is_cancelled(&self) -> bool {
        self.parent.is_cancelled()
    }
}
