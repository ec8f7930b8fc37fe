//! Error types for usage database operations.
//!
//! Provides a unified error type covering all failure modes: I/O,
//! serialization, document validation, bundle checksum verification, and
//! argument parsing.

use thiserror::Error;
use usage_schema_core::ParserError;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Document validation failure (e.g., misplaced optional entry).
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Bundle hash mismatch between stored and recomputed values.
    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),

    /// All configured loader sources failed.
    #[error("no usage sources available")]
    NoSourcesAvailable,

    /// No document is registered for the requested command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Arguments did not match the command's usage.
    #[error(transparent)]
    Parser(#[from] ParserError),
}

/// Convenience alias for results with [`DatabaseError`].
pub type Result<T> = std::result::Result<T, DatabaseError>;
