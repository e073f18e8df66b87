//! Error types for the phrase editor
//!
//! Each concern owns a small error enum; `EditorError` is the umbrella the
//! JS-facing layer converts into readable messages.

use thiserror::Error;

/// Failures raised by the transform registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// An id that is not in the registry reached `apply`
    #[error("Unknown operation: {0}")]
    UnknownOperationKind(String),

    /// A user-supplied regular expression failed to compile
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Failures at the execution boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Another operation is already in flight
    #[error("An operation is already running")]
    Busy,

    /// The off-thread worker could not be created or has gone away
    #[error("Worker unavailable: {0}")]
    WorkerUnavailable(String),

    /// A message could not be encoded or decoded
    #[error("Worker protocol error: {0}")]
    Protocol(String),

    /// The worker reported a failure for the request
    #[error("{0}")]
    Failed(String),
}

/// Import-time validation failures (user-facing, non-fatal)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("Only .txt files are supported (got '{0}')")]
    FileTypeRejected(String),

    #[error("File is too large: {size} bytes (maximum {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Text is too large: {size} bytes (maximum {max} bytes)")]
    TextTooLarge { size: usize, max: usize },
}

/// Persistence failures; callers log these and carry on
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Storage is not available")]
    Unavailable,

    #[error("Failed to write state: {0}")]
    WriteFailure(String),

    #[error("Failed to (de)serialize state: {0}")]
    Serialization(String),
}

/// Configuration could not be parsed or is out of range
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(String),

    #[error("Invalid configuration value for {field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}

/// Top-level error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
