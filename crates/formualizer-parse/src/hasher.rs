//! Thin wrapper over the standard library's `DefaultHasher`, used to compute
//! stable fingerprints for parsed ASTs (see `ASTNode::fingerprint`).

use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

#[derive(Default)]
pub struct FormulaHasher(DefaultHasher);

impl FormulaHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Hasher for FormulaHasher {
    fn finish(&self) -> u64 {
        self.0.finish()
    }
    fn write(&mut self, bytes: &[u8]) {
        self.0.write(bytes)
    }
}
