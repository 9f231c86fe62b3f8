//! Directive scanning.

mod scanner;
mod types;

pub use scanner::{scan, ScannedSource, Scanner};
pub use types::{Directive, DirectiveKind, LineKind, SourceLine, Tag};
