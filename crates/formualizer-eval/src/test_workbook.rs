//! A minimal in-memory `EvalContext` used by the builtin test suites (and a
//! convenient starting point for embedders who don't need a real workbook
//! backend). Not part of the crate's public contract beyond tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use rustc_hash::FxHashMap;

use crate::context::EvalContext;
use crate::function::Function;
use crate::reference::{CellRef, Coord, RangeRef};
use crate::registry::FunctionRegistry;
use crate::value::{RangeValue, Value};

pub struct TestWorkbook {
    cells: FxHashMap<(Option<String>, Coord), Value>,
    names: RwLock<FxHashMap<String, Value>>,
    registry: FunctionRegistry,
    cancelled: AtomicBool,
}

impl TestWorkbook {
    pub fn new() -> Self {
        let mut registry = FunctionRegistry::new();
        crate::builtins::register_all(&mut registry);
        Self {
            cells: FxHashMap::default(),
            names: RwLock::new(FxHashMap::default()),
            registry,
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn with_cell(mut self, sheet: Option<&str>, row: u32, col: u32, value: Value) -> Self {
        self.cells
            .insert((sheet.map(String::from), Coord::new(row, col)), value);
        self
    }

    pub fn with_cell_a1(mut self, a1: &str, value: Value) -> Self {
        let (row, col) = parse_a1(a1).expect("valid A1 reference");
        self.cells.insert((None, Coord::new(row, col)), value);
        self
    }

    pub fn with_named_range(self, name: &str, value: Value) -> Self {
        self.set_named_range(name, value);
        self
    }

    /// Register (or overwrite) a named range after the workbook may already
    /// be shared behind an `Arc` — the one piece of interior mutability this
    /// test harness needs, to let a named `LAMBDA` recurse by calling its
    /// own name.
    pub fn set_named_range(&self, name: &str, value: Value) {
        self.names
            .write()
            .unwrap()
            .insert(name.to_ascii_uppercase(), value);
    }

    pub fn with_function(mut self, f: Arc<dyn Function>) -> Self {
        self.registry.register(f);
        self
    }

    pub fn set_cancelled(&self, cancelled: bool) {
        self.cancelled.store(cancelled, Ordering::Relaxed);
    }

    pub fn into_ctx(self) -> Arc<dyn EvalContext> {
        Arc::new(self)
    }
}

impl Default for TestWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalContext for TestWorkbook {
    fn get_cell(&self, cell: &CellRef) -> Value {
        self.cells
            .get(&(cell.sheet.clone(), cell.coord))
            .cloned()
            .unwrap_or(Value::Empty)
    }

    fn get_range(&self, range: &RangeRef) -> Value {
        let mut rows = Vec::with_capacity(range.rows() as usize);
        for r in range.start.row..=range.end.row {
            let mut out_row = Vec::with_capacity(range.cols() as usize);
            for c in range.start.col..=range.end.col {
                out_row.push(
                    self.cells
                        .get(&(range.sheet.clone(), Coord::new(r, c)))
                        .cloned()
                        .unwrap_or(Value::Empty),
                );
            }
            rows.push(out_row);
        }
        Value::Range(RangeValue::new(rows))
    }

    fn get_function(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.registry.get(name)
    }

    fn resolve_name(&self, name: &str) -> Option<Value> {
        self.names
            .read()
            .unwrap()
            .get(&name.to_ascii_uppercase())
            .cloned()
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Parse a bare `A1`-style reference (no sheet prefix, no range) into a
/// zero-based (row, col) pair.
fn parse_a1(a1: &str) -> Option<(u32, u32)> {
    let split_at = a1.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = a1.split_at(split_at);
    let col = crate::reference::letters_to_col(letters)?;
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a1_parsing() {
        assert_eq!(parse_a1("A1"), Some((0, 0)));
        assert_eq!(parse_a1("B2"), Some((1, 1)));
        assert_eq!(parse_a1("AA10"), Some((9, 26)));
        assert_eq!(parse_a1(""), None);
    }

    #[test]
    fn cell_lookup_defaults_to_empty() {
        let ctx = TestWorkbook::new().into_ctx();
        assert_eq!(ctx.get_cell(&CellRef::new(None, 0, 0)), Value::Empty);
    }
}
