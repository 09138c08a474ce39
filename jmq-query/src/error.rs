//! Error types for JMQ

use jmespath::{ErrorReason, JmespathError, RuntimeError};
use thiserror::Error;

/// JMQ error types
///
/// Every variant aborts the run. Per-record failures (bad JSON in an input
/// field, a type mismatch during evaluation) never become a `JmqError`; they
/// are captured as plain messages on the record itself.
#[derive(Debug, Error)]
pub enum JmqError {
    /// Query text failed to compile.
    #[error("Invalid query expression: {0}")]
    InvalidQuery(String),
    /// Query referenced a function that is not registered.
    #[error("Unknown function in query: {0}")]
    UnknownFunction(String),
    /// An extension function was called with a syntactically invalid argument.
    #[error("Invalid function call: {0}")]
    InvalidFunctionCall(String),
    /// Run options are unusable (bad indent, empty field list, ...).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// I/O operation failed while reading or writing records.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A record line could not be decoded or encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, JmqError>;

/// Classification of a failed query evaluation.
#[derive(Debug)]
pub enum EvalError {
    /// The query itself is broken; the whole run must stop.
    Fatal(JmqError),
    /// One record carried bad data; the message is captured on the record.
    Recoverable(String),
}

/// Split an evaluation failure into run-aborting and per-record cases.
///
/// An unknown function, a wrong argument count, and a `Parse` reason raised
/// during evaluation (an extension function rejecting its mode literal) all
/// mean the query text itself is broken, no matter which record it met first.
/// Everything else — type mismatches included — depends on the data in one
/// record and is captured there instead.
pub fn classify_eval_error(err: JmespathError) -> EvalError {
    match &err.reason {
        ErrorReason::Runtime(RuntimeError::UnknownFunction(name)) => {
            EvalError::Fatal(JmqError::UnknownFunction(name.clone()))
        }
        ErrorReason::Runtime(RuntimeError::TooManyArguments { .. })
        | ErrorReason::Runtime(RuntimeError::NotEnoughArguments { .. }) => {
            EvalError::Fatal(JmqError::InvalidFunctionCall(err.to_string()))
        }
        ErrorReason::Parse(_) => EvalError::Fatal(JmqError::InvalidFunctionCall(err.to_string())),
        _ => EvalError::Recoverable(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_function_is_fatal() {
        let err = JmespathError::new(
            "nope(@)",
            0,
            ErrorReason::Runtime(RuntimeError::UnknownFunction("nope".to_string())),
        );
        match classify_eval_error(err) {
            EvalError::Fatal(JmqError::UnknownFunction(name)) => assert_eq!(name, "nope"),
            other => panic!("expected fatal unknown function, got {:?}", other),
        }
    }

    #[test]
    fn parse_reason_during_eval_is_fatal() {
        let err = JmespathError::new(
            "unroll(@, 'k', 'v', 'sometimes')",
            0,
            ErrorReason::Parse("bad mode".to_string()),
        );
        assert!(matches!(
            classify_eval_error(err),
            EvalError::Fatal(JmqError::InvalidFunctionCall(_))
        ));
    }
}
