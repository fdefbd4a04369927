//! Error types for the toolgate enforcement spine
//!
//! Construction-time and I/O failures are Rust errors; plan-level halts are
//! not. A halted run is a normal `ExecutionReport` carrying a `HaltReason` —
//! see the `engine` module for the distinction.

use thiserror::Error;

/// Main error type for the enforcement spine
#[derive(Error, Debug)]
pub enum EngineError {
    /// A tool name was registered twice in the same registry
    #[error("Duplicate tool registration: {name}")]
    DuplicateTool { name: String },

    /// Configuration errors (bad project root, invalid registry setup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("Engine error: {0}")]
    Generic(String),
}

/// Result type alias for spine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Convert anyhow errors to EngineError
impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Generic(err.to_string())
    }
}
