//! Case-insensitive function lookup, with alias indirection for the
//! spellings Excel treats as interchangeable (`MODE` / `MODE.SNGL`, …).

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::function::Function;

#[derive(Default)]
pub struct FunctionRegistry {
    functions: FxHashMap<String, Arc<dyn Function>>,
    aliases: FxHashMap<String, String>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, f: Arc<dyn Function>) {
        self.functions.insert(f.name().to_ascii_uppercase(), f);
    }

    /// Register `alias` so that looking it up returns the same function as
    /// `target`. `target` must already be registered.
    pub fn alias(&mut self, alias: &str, target: &str) {
        self.aliases
            .insert(alias.to_ascii_uppercase(), target.to_ascii_uppercase());
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        let key = name.to_ascii_uppercase();
        let key = self.aliases.get(&key).cloned().unwrap_or(key);
        self.functions.get(&key).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::sync::Arc;

    struct Dummy;
    impl Function for Dummy {
        fn name(&self) -> &'static str {
            "DUMMY"
        }
        fn call_eager(&self, _args: &[Value], _ctx: &Arc<dyn crate::context::EvalContext>, _depth: usize) -> Value {
            Value::Number(1.0)
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut reg = FunctionRegistry::new();
        reg.register(Arc::new(Dummy));
        assert!(reg.get("dummy").is_some());
        assert!(reg.get("DuMmY").is_some());
        assert!(reg.get("missing").is_none());
    }

    #[test]
    fn alias_resolves_to_target() {
        let mut reg = FunctionRegistry::new();
        reg.register(Arc::new(Dummy));
        reg.alias("ALIASED", "DUMMY");
        assert!(reg.get("aliased").is_some());
    }
}
