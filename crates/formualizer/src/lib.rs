//! Meta crate that re-exports the primary Formualizer building blocks with
//! sensible defaults. Downstream users can depend on this crate and opt into
//! specific layers via feature flags while keeping access to the underlying
//! crates when deeper integration is required.

#[cfg(feature = "common")]
pub use formualizer_common as common;

#[cfg(feature = "parse")]
pub use formualizer_parse as parse;

#[cfg(feature = "eval")]
pub use formualizer_eval as eval;

#[cfg(feature = "common")]
pub use formualizer_common::{ExcelError, ExcelErrorKind, LiteralValue};

#[cfg(feature = "eval")]
pub mod doc_examples;
