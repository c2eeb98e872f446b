//! Error types for database abstraction operations.
//!
//! Distinguishes metadata failures, fatal version-floor violations (with and
//! without an edition that still supports the engine), initialization-script
//! failures and exhausted connection retries.

use schema_history_core::{CoreError, DatabaseType, Edition};
use thiserror::Error;

/// Failure reported by a driver collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while working with a migration target.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Engine metadata (version, user, auto-commit state) could not be read.
    #[error("{message}")]
    MetadataUnavailable {
        message: String,
        #[source]
        source: BoxError,
    },

    /// The engine is older than anything any edition supports.
    #[error(
        "{database_type} {actual} is outdated and no longer supported; {database_type} {required} and newer are supported"
    )]
    UnsupportedDatabaseVersion {
        database_type: DatabaseType,
        actual: String,
        required: String,
    },

    /// The engine is too old for this edition but a higher edition supports it.
    #[error("{database_type} {actual} is no longer supported by this edition; upgrade to {edition} to keep using it")]
    EditionUpgradeRequired {
        edition: Edition,
        database_type: DatabaseType,
        actual: String,
    },

    /// A statement of an initialization or migration script failed.
    #[error("script {resource} failed at line {line}: {statement}")]
    ScriptExecutionFailure {
        resource: String,
        line: usize,
        statement: String,
        #[source]
        source: BoxError,
    },

    /// Opening a raw connection failed after exhausting the retry budget.
    #[error("unable to obtain connection from database after {attempts} attempt(s)")]
    ConnectionFailed {
        attempts: u32,
        #[source]
        source: BoxError,
    },

    /// A single ad-hoc statement failed on a wrapped connection.
    #[error("statement failed: {sql}")]
    Statement {
        sql: String,
        #[source]
        source: BoxError,
    },

    /// The raw main connection was already handed over or closed.
    #[error("main connection is no longer available")]
    ConnectionClosed,

    /// No schema was configured and the connection does not report one.
    #[error("no schema configured and the connection reports no current schema")]
    NoDefaultSchema,

    /// Invalid core value (version, placeholder, engine identifier, resource).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Configuration file I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DatabaseError {
    pub(crate) fn metadata(message: impl Into<String>, source: BoxError) -> Self {
        DatabaseError::MetadataUnavailable {
            message: message.into(),
            source,
        }
    }

    /// Returns `true` for the version-floor violations.
    pub fn is_version_floor_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::UnsupportedDatabaseVersion { .. }
                | DatabaseError::EditionUpgradeRequired { .. }
        )
    }

    /// Formats the error followed by its full `source()` chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {self}\n");

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {depth}: {err}"));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Convenience alias for results with [`DatabaseError`].
pub type Result<T> = std::result::Result<T, DatabaseError>;
