//! JMQ Query - JMESPath compilation and the extension function table
//!
//! This crate provides the query layer for JMQ with no I/O dependencies:
//!
//! - A process-wide runtime holding the builtin and extension function tables
//! - Query compilation into reusable expressions
//! - Error types and fatal/recoverable classification of evaluation failures
//!
//! The JMESPath grammar and evaluation semantics themselves come from the
//! `jmespath` crate; this crate only extends its function table.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod functions;

// Re-export commonly used types
pub use error::{classify_eval_error, EvalError, JmqError, Result};
pub use functions::UnrollMode;
pub use jmespath::{Expression, Rcvar, Variable};

use jmespath::Runtime;
use lazy_static::lazy_static;

lazy_static! {
    // The `jmespath` crate hands out expressions borrowing the runtime they
    // were compiled on, so the table lives for the whole process. Runtime is
    // Sync but not Send, which rules out a OnceLock static.
    static ref RUNTIME: Runtime = {
        let mut runtime = Runtime::new();
        runtime.register_builtin_functions();
        functions::register_extension_functions(&mut runtime);
        runtime
    };
}

/// Compile a query against the shared runtime.
///
/// The returned expression is immutable, side-effect-free, and meant to be
/// compiled once per run and reused across every record.
pub fn compile(query: &str) -> Result<Expression<'static>> {
    RUNTIME
        .compile(query)
        .map_err(|err| JmqError::InvalidQuery(err.to_string()))
}
