//! Error types for core value parsing.
//!
//! Covers malformed version strings, unexpanded placeholders, unknown engine
//! identifiers, and failures reading file-backed resources.

use thiserror::Error;

/// Errors produced while parsing or expanding core values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Version string is not of the form `major[.minor]`.
    #[error("invalid version '{0}': expected major[.minor]")]
    InvalidVersion(String),

    /// Template references a placeholder with no supplied value.
    #[error("no value provided for placeholder: ${{{0}}}")]
    MissingPlaceholder(String),

    /// Engine identifier or product name is not a known database type.
    #[error("unknown database type: {0}")]
    UnknownDatabaseType(String),

    /// File-backed resource could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results with [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
