//! litweave - literate document weaver
//!
//! Reads a script that mixes ordinary code with tagged comment lines
//! (directives), executes it, and weaves a document interleaving prose,
//! computed values, captured output, included files and figures.
//!
//! # Pipeline
//!
//! - **Scan**: classify lines and coalesce directives ([`readers`])
//! - **Execute**: run the code, snapshotting state at each directive ([`engine`])
//! - **Resolve**: turn each directive into segments ([`resolve`])
//! - **Render**: hand figures to render backends ([`backends`])
//! - **Weave**: substitute `{{ expr }}` templates in prose ([`weaver`])
//!
//! # Example
//!
//! ```no_run
//! use litweave::interface::{weave_source, Context};
//!
//! let ctx = Context::from_current_dir().unwrap();
//! let doc = weave_source(&ctx, "x = 6 * 7\n#' x is {{ x }}\n", None);
//! assert_eq!(doc.to_markdown(), "x is 42\n");
//! ```

pub mod backends;
pub mod commands;
pub mod config;
pub mod engine;
pub mod errors;
pub mod host;
pub mod interface;
pub mod io;
pub mod model;
pub mod readers;
pub mod resolve;
pub mod text_location;
pub mod weaver;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types
pub use config::Config;
pub use errors::{LitweaveError, Result, WeaveError};
pub use interface::{weave_file, weave_source, Context};
pub use model::{Segment, WovenDocument};

// Re-export command options
pub use commands::{CheckOptions, OutputFormat, WatchOptions, WeaveOptions};
