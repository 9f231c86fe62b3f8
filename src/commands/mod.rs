//! Command implementations behind the CLI.

mod check;
mod watch;
mod weave;

pub use check::{check, CheckOptions};
pub use watch::{watch, WatchOptions};
pub use weave::{render, weave, write_document, OutputFormat, WeaveOptions};
