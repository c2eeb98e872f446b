//! Error types for the SQLite driver and history table.
//!
//! Provides a unified error type covering SQLite access, row conversion and
//! failures raised by the dialect-aware database layer.

use thiserror::Error;

/// Errors that can occur while working with a SQLite migration target.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// A history row could not be converted into an [`AppliedMigration`](crate::AppliedMigration).
    #[error("conversion error: {0}")]
    ConversionError(String),

    /// Failure reported by the database abstraction layer.
    #[error(transparent)]
    HistoryError(#[from] schema_history_db::DatabaseError),
}

impl SqliteError {
    /// Formats the error followed by its full `source()` chain.
    pub fn format_detailed(&self) -> String {
        match self {
            SqliteError::HistoryError(err) => err.format_detailed(),
            other => format!("Error: {other}\n"),
        }
    }
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
