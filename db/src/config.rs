//! Connection and schema-history configuration.
//!
//! Defines the YAML-serializable settings that control how raw connections
//! are opened and initialized, and where the schema-history table lives.
//!
//! # Example YAML
//!
//! ```yaml
//! init_sql: "PRAGMA foreign_keys = ON;"
//! connect_retries: 3
//! connect_retries_interval: 10
//! schema: main
//! table: schema_history
//! installed_by: deployer
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default name of the schema-history table.
pub const DEFAULT_TABLE: &str = "schema_history";

/// Default cap, in seconds, for the back-off between connection attempts.
pub const DEFAULT_CONNECT_RETRIES_INTERVAL: u64 = 120;

/// Settings for a migration target.
///
/// The data source itself is not part of the file; it is passed alongside as
/// a [`ConnectionSource`](crate::ConnectionSource).
///
/// # Examples
///
/// ```
/// use schema_history_db::DatabaseConfig;
///
/// let config: DatabaseConfig = serde_yaml::from_str("connect_retries: 2").unwrap();
/// assert_eq!(config.connect_retries, 2);
/// assert_eq!(config.table, "schema_history");
/// assert!(config.init_sql.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQL run on every raw connection before it is wrapped.
    pub init_sql: Option<String>,
    /// Additional attempts after the first failed connection attempt.
    pub connect_retries: u32,
    /// Upper bound, in seconds, for the doubling back-off between attempts.
    pub connect_retries_interval: u64,
    /// Schema holding the history table; the connection's current schema
    /// when unset.
    pub schema: Option<String>,
    /// Name of the schema-history table.
    pub table: String,
    /// User recorded as `installed_by`; the database user when unset.
    pub installed_by: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            init_sql: None,
            connect_retries: 0,
            connect_retries_interval: DEFAULT_CONNECT_RETRIES_INTERVAL,
            schema: None,
            table: DEFAULT_TABLE.to_string(),
            installed_by: None,
        }
    }
}

impl DatabaseConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::DatabaseError::Io) if the file cannot be read, or
    /// [`Yaml`](crate::DatabaseError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::DatabaseError::Io) if the file cannot be
    /// written, or [`Yaml`](crate::DatabaseError::Yaml) if serialization
    /// fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns the initialization SQL unless it is unset or blank.
    pub fn init_sql(&self) -> Option<&str> {
        self.init_sql
            .as_deref()
            .filter(|sql| !sql.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
init_sql: "SET search_path TO app;"
connect_retries: 5
connect_retries_interval: 30
schema: app
table: history
installed_by: ci
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: DatabaseConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.init_sql(), Some("SET search_path TO app;"));
        assert_eq!(config.connect_retries, 5);
        assert_eq!(config.connect_retries_interval, 30);
        assert_eq!(config.schema.as_deref(), Some("app"));
        assert_eq!(config.table, "history");
        assert_eq!(config.installed_by.as_deref(), Some("ci"));
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: DatabaseConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, DatabaseConfig::default());
        assert_eq!(config.connect_retries_interval, DEFAULT_CONNECT_RETRIES_INTERVAL);
    }

    #[test]
    fn test_blank_init_sql_is_ignored() {
        let config = DatabaseConfig {
            init_sql: Some("   \n".into()),
            ..DatabaseConfig::default()
        };
        assert_eq!(config.init_sql(), None);
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.yml");

        let original: DatabaseConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = DatabaseConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DatabaseConfig::load(dir.path().join("nope.yml")).unwrap_err();
        assert!(matches!(err, crate::DatabaseError::Io(_)));
    }
}
