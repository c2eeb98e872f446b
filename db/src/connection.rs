//! Driver collaborators and the dialect-specific connection wrapper.
//!
//! A driver plugs into this crate by implementing three traits:
//!
//! - [`ConnectionSource`]: the data-source handle that opens raw connections.
//! - [`RawConnection`]: a single blocking connection.
//! - [`DatabaseMetadata`]: engine product name, version and user.
//!
//! [`Connection`] wraps a raw connection once it has been initialized and
//! carries the dialect facts callers need alongside it.

use std::cell::RefCell;
use std::fmt;
use std::thread;
use std::time::Duration;

use schema_history_core::DatabaseType;
use tracing::{debug, warn};

use crate::error::{BoxError, DatabaseError, Result};

/// Engine metadata reported by a raw connection.
pub trait DatabaseMetadata {
    /// Product name, e.g. `PostgreSQL` or `Microsoft SQL Server`.
    fn product_name(&self) -> std::result::Result<String, BoxError>;

    fn major_version(&self) -> std::result::Result<u32, BoxError>;

    fn minor_version(&self) -> std::result::Result<u32, BoxError>;

    /// User name the connection is authenticated as.
    fn user_name(&self) -> std::result::Result<String, BoxError>;
}

/// A single blocking connection to an engine.
pub trait RawConnection {
    type Metadata: DatabaseMetadata;

    /// Returns a metadata handle for this connection.
    fn metadata(&self) -> std::result::Result<Self::Metadata, BoxError>;

    /// Current auto-commit state.
    fn auto_commit(&self) -> std::result::Result<bool, BoxError>;

    /// Executes one statement, discarding any result rows.
    fn execute(&mut self, sql: &str) -> std::result::Result<(), BoxError>;

    /// Runs a query and returns the first column of the first row, if any.
    fn query_string(&mut self, sql: &str) -> std::result::Result<Option<String>, BoxError>;

    fn close(self) -> std::result::Result<(), BoxError>
    where
        Self: Sized;
}

/// A data-source handle able to open new raw connections.
pub trait ConnectionSource {
    type Connection: RawConnection;

    fn open(&self) -> std::result::Result<Self::Connection, BoxError>;
}

/// Opens a raw connection, retrying up to `retries` extra times.
///
/// The wait between attempts starts at one second and doubles, capped at
/// `max_interval_secs`. Each failed attempt is logged as a warning.
///
/// # Errors
///
/// Returns [`DatabaseError::ConnectionFailed`] with the last driver error once
/// the retry budget is exhausted.
pub fn open_with_retries<S: ConnectionSource>(
    data_source: &S,
    retries: u32,
    max_interval_secs: u64,
) -> Result<S::Connection> {
    let mut attempts = 0u32;
    let mut wait_secs = 1u64;

    loop {
        attempts += 1;
        match data_source.open() {
            Ok(connection) => {
                debug!(attempts, "opened raw connection");
                return Ok(connection);
            }
            Err(source) if attempts > retries => {
                return Err(DatabaseError::ConnectionFailed { attempts, source });
            }
            Err(err) => {
                let delay = wait_secs.min(max_interval_secs);
                warn!(
                    attempt = attempts,
                    retries,
                    "connection error: {err}; retrying in {delay} sec"
                );
                if delay > 0 {
                    thread::sleep(Duration::from_secs(delay));
                }
                wait_secs = wait_secs.saturating_mul(2);
            }
        }
    }
}

/// An initialized connection, wrapped with the facts of its dialect.
///
/// Statements run through `&self`: a wrapper is shared between the main and
/// migration roles when the dialect uses a single connection.
pub struct Connection<C: RawConnection> {
    raw: RefCell<C>,
    database_type: DatabaseType,
    current_schema_query: Option<&'static str>,
    original_auto_commit: bool,
}

impl<C: RawConnection> Connection<C> {
    pub(crate) fn new(
        raw: C,
        database_type: DatabaseType,
        current_schema_query: Option<&'static str>,
        original_auto_commit: bool,
    ) -> Self {
        Self {
            raw: RefCell::new(raw),
            database_type,
            current_schema_query,
            original_auto_commit,
        }
    }

    pub fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    /// Auto-commit state the target had before this tool touched it.
    pub fn original_auto_commit(&self) -> bool {
        self.original_auto_commit
    }

    /// Executes one statement.
    pub fn execute(&self, sql: &str) -> Result<()> {
        self.raw
            .borrow_mut()
            .execute(sql)
            .map_err(|source| DatabaseError::Statement {
                sql: sql.to_string(),
                source,
            })
    }

    /// Returns the first column of the first row of `sql`, if any.
    pub fn query_string(&self, sql: &str) -> Result<Option<String>> {
        self.raw
            .borrow_mut()
            .query_string(sql)
            .map_err(|source| DatabaseError::Statement {
                sql: sql.to_string(),
                source,
            })
    }

    /// The schema statements resolve unqualified names against, or `None`
    /// when the dialect cannot report one.
    pub fn current_schema(&self) -> Result<Option<String>> {
        match self.current_schema_query {
            Some(query) => self.query_string(query),
            None => Ok(None),
        }
    }

    /// Runs `f` with exclusive access to the raw connection.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly from within `f`.
    pub fn with_raw<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.raw.borrow_mut())
    }

    /// Closes the raw connection, logging instead of failing.
    pub(crate) fn close(self) {
        close_quietly(self.raw.into_inner(), self.database_type);
    }
}

impl<C: RawConnection> fmt::Debug for Connection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("database_type", &self.database_type)
            .field("original_auto_commit", &self.original_auto_commit)
            .finish_non_exhaustive()
    }
}

pub(crate) fn close_quietly<C: RawConnection>(raw: C, database_type: DatabaseType) {
    match raw.close() {
        Ok(()) => debug!(%database_type, "closed connection"),
        Err(err) => warn!(%database_type, "error while closing connection: {err}"),
    }
}
