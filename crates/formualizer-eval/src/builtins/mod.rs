//! Registration entry point for the three built-in function families this
//! engine implements: statistics (with the criteria mini-language), text
//! (including the `TEXT` numeric-format subset), and lambda/higher-order.

pub mod lambda;
pub mod stats;
pub mod text;
pub mod util;

use crate::registry::FunctionRegistry;

pub fn register_all(reg: &mut FunctionRegistry) {
    stats::register_builtins(reg);
    text::register_builtins(reg);
    lambda::register_builtins(reg);
}
