//! High-level interface for weave operations.

mod context;
mod document;

pub use context::Context;
pub use document::{weave_file, weave_source};
