//! The embedded host language.
//!
//! A small Python-flavoured language: one statement per line, indentation
//! blocks, `def`/`if`/`for`/`while`, and a handful of builtins. Directive
//! payloads and the code between directives are run by [`Interpreter`],
//! whose globals persist for the whole document.

mod ast;
mod builtins;
mod error;
mod interpreter;
mod lexer;
mod parser;
mod value;

pub use builtins::Builtin;
pub use error::{HostError, HostErrorKind, HostResult};
pub use interpreter::{Interpreter, MAX_CALL_DEPTH};
pub use parser::{parse_expression, parse_program};
pub use value::{format_float, Number, Value};
