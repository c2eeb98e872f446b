//! rusqlite-backed driver collaborators.
//!
//! [`SqliteSource`] opens [`SqliteConnection`]s, which report
//! [`SqliteMetadata`] for the linked SQLite library.

use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension};
use schema_history_db::{BoxError, ConnectionSource, DatabaseMetadata, RawConnection};
use tracing::debug;

/// Where SQLite connections come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqliteSource {
    /// A database file, created on first open.
    File(PathBuf),
    /// A private in-memory database per connection.
    Memory,
}

impl SqliteSource {
    pub fn file(path: impl AsRef<Path>) -> Self {
        SqliteSource::File(path.as_ref().to_path_buf())
    }

    pub fn in_memory() -> Self {
        SqliteSource::Memory
    }
}

impl ConnectionSource for SqliteSource {
    type Connection = SqliteConnection;

    fn open(&self) -> Result<SqliteConnection, BoxError> {
        let conn = match self {
            SqliteSource::File(path) => {
                debug!(path = %path.display(), "opening sqlite database");
                Connection::open(path)?
            }
            SqliteSource::Memory => Connection::open_in_memory()?,
        };
        Ok(SqliteConnection { conn })
    }
}

/// A single rusqlite connection.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    /// Wraps an existing rusqlite connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn inner(&self) -> &Connection {
        &self.conn
    }

    pub fn inner_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl RawConnection for SqliteConnection {
    type Metadata = SqliteMetadata;

    fn metadata(&self) -> Result<SqliteMetadata, BoxError> {
        Ok(SqliteMetadata::linked())
    }

    fn auto_commit(&self) -> Result<bool, BoxError> {
        Ok(self.conn.is_autocommit())
    }

    fn execute(&mut self, sql: &str) -> Result<(), BoxError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn query_string(&mut self, sql: &str) -> Result<Option<String>, BoxError> {
        let value = self
            .conn
            .query_row(sql, [], |row| {
                Ok(match row.get_ref(0)? {
                    ValueRef::Null => None,
                    ValueRef::Integer(i) => Some(i.to_string()),
                    ValueRef::Real(f) => Some(f.to_string()),
                    ValueRef::Text(text) | ValueRef::Blob(text) => {
                        Some(String::from_utf8_lossy(text).into_owned())
                    }
                })
            })
            .optional()?;
        Ok(value.flatten())
    }

    fn close(self) -> Result<(), BoxError> {
        self.conn.close().map_err(|(_, err)| err.into())
    }
}

/// Metadata of the SQLite library this binary links against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqliteMetadata {
    major: u32,
    minor: u32,
}

impl SqliteMetadata {
    /// Reads the version of the linked library, e.g. `3045001` is `3.45`.
    pub fn linked() -> Self {
        Self::from_version_number(rusqlite::version_number())
    }

    fn from_version_number(number: i32) -> Self {
        let number = number.max(0) as u32;
        Self {
            major: number / 1_000_000,
            minor: (number / 1_000) % 1_000,
        }
    }
}

impl DatabaseMetadata for SqliteMetadata {
    fn product_name(&self) -> Result<String, BoxError> {
        Ok("SQLite".to_string())
    }

    fn major_version(&self) -> Result<u32, BoxError> {
        Ok(self.major)
    }

    fn minor_version(&self) -> Result<u32, BoxError> {
        Ok(self.minor)
    }

    /// SQLite has no users; reports the operating-system user instead.
    fn user_name(&self) -> Result<String, BoxError> {
        Ok(os_user_name())
    }
}

/// `USER` on Unix, `USERNAME` on Windows, or empty when neither is set.
fn os_user_name() -> String {
    ["USER", "USERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|name| !name.is_empty()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_number_split() {
        let metadata = SqliteMetadata::from_version_number(3_045_001);
        assert_eq!(metadata.major_version().unwrap(), 3);
        assert_eq!(metadata.minor_version().unwrap(), 45);
    }

    #[test]
    fn test_user_name_falls_back_to_os_user() {
        let expected = std::env::var("USER")
            .ok()
            .filter(|name| !name.is_empty())
            .or_else(|| std::env::var("USERNAME").ok().filter(|name| !name.is_empty()))
            .unwrap_or_default();
        assert_eq!(SqliteMetadata::linked().user_name().unwrap(), expected);
    }

    #[test]
    fn test_linked_library_is_sqlite_3() {
        assert_eq!(SqliteMetadata::linked().major, 3);
    }

    #[test]
    fn test_query_string_types() {
        let mut conn = SqliteSource::in_memory().open().unwrap();
        assert_eq!(conn.query_string("SELECT 'x'").unwrap().as_deref(), Some("x"));
        assert_eq!(conn.query_string("SELECT 42").unwrap().as_deref(), Some("42"));
        assert_eq!(conn.query_string("SELECT NULL").unwrap(), None);
        conn.execute("CREATE TABLE t (a TEXT)").unwrap();
        assert_eq!(conn.query_string("SELECT a FROM t").unwrap(), None);
    }

    #[test]
    fn test_execute_reports_errors() {
        let mut conn = SqliteSource::in_memory().open().unwrap();
        assert!(conn.execute("CREATE TABLE").is_err());
        assert!(conn.auto_commit().unwrap());
        conn.close().unwrap();
    }

    #[test]
    fn test_file_source_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        let mut conn = SqliteSource::file(&path).open().unwrap();
        conn.execute("CREATE TABLE t (a INT)").unwrap();
        conn.close().unwrap();
        assert!(path.exists());
    }
}
