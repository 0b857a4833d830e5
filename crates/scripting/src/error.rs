//! Error types for the scripting crate

use reflex_core::EngineError;

/// Script-specific error types
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Parse error
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Evaluation error
    #[error("Evaluation error: {0}")]
    EvalError(String),

    /// Expression nesting limit exceeded
    #[error("Expression nesting exceeds {0} levels")]
    TooDeep(usize),

    /// Invalid function call
    #[error("Invalid call: {0}")]
    InvalidCall(String),

    /// Host-side failure
    #[error("Host error: {0}")]
    HostError(String),
}

impl From<ScriptError> for EngineError {
    fn from(err: ScriptError) -> Self {
        EngineError::Script(err.to_string())
    }
}

/// Result type for scripting operations
pub type Result<T> = std::result::Result<T, ScriptError>;
