//! Schema-history table operations on SQLite.
//!
//! Provides [`SchemaHistory`] for creating the history table, appending
//! applied migrations and reading back rows appended since a watermark. All
//! SQL text comes from the dialect-aware [`Database`]; this module only binds
//! parameters and converts rows.
//!
//! # Example
//!
//! ```no_run
//! use schema_history_db::{Database, DatabaseConfig};
//! use schema_history_sqlite::{SchemaHistory, SqliteSource};
//!
//! let db = Database::connect(DatabaseConfig::default(), SqliteSource::file("app.db")).unwrap();
//! let history = SchemaHistory::new(&db).unwrap();
//! history.create().unwrap();
//!
//! for row in history.applied_since(-1).unwrap() {
//!     println!("{} {}", row.installed_rank, row.description);
//! }
//! ```

use std::time::Instant;

use chrono::NaiveDateTime;
use rusqlite::{Row, params};
use schema_history_core::{Resource, Table};
use schema_history_db::{Database, Dialect};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::driver::SqliteSource;
use crate::error::{Result, SqliteError};

/// Format SQLite writes into `installed_on`.
const INSTALLED_ON_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A migration to record in the history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub version: Option<String>,
    pub description: String,
    #[serde(rename = "type")]
    pub migration_type: String,
    pub script: String,
    pub checksum: Option<i32>,
    pub installed_by: String,
    /// Milliseconds.
    pub execution_time: i64,
    pub success: bool,
}

/// A row read back from the history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMigration {
    pub installed_rank: i64,
    pub version: Option<String>,
    pub description: String,
    #[serde(rename = "type")]
    pub migration_type: String,
    pub script: String,
    pub checksum: Option<i32>,
    pub installed_on: NaiveDateTime,
    pub installed_by: String,
    pub execution_time: i64,
    pub success: bool,
}

/// Snapshot of the history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryStatus {
    pub table: String,
    pub exists: bool,
    pub entries: usize,
    pub last_rank: Option<i64>,
}

/// The schema-history table of one SQLite database.
pub struct SchemaHistory<'a> {
    db: &'a Database<SqliteSource>,
    table: Table,
}

impl<'a> SchemaHistory<'a> {
    /// Resolves the configured history table.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::HistoryError`] if the main connection cannot be
    /// initialized or no schema can be determined.
    pub fn new(db: &'a Database<SqliteSource>) -> Result<Self> {
        let table = db.history_table()?;
        Ok(Self { db, table })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Checks whether the history table exists.
    pub fn exists(&self) -> Result<bool> {
        let sql = format!(
            "SELECT COUNT(*) FROM {}.sqlite_master WHERE type = 'table' AND name = ?1",
            self.db.quote(&[self.table.schema()])
        );
        let connection = self.db.get_main_connection()?;
        let count: i64 = connection.with_raw(|raw| {
            raw.inner()
                .query_row(&sql, [self.table.name()], |row| row.get(0))
        })?;
        Ok(count > 0)
    }

    /// Creates the history table unless it already exists.
    ///
    /// Runs inside a transaction when the dialect supports transactional DDL.
    /// Returns `true` if the table was created.
    pub fn create(&self) -> Result<bool> {
        if self.exists()? {
            debug!(table = %self.table, "history table already exists");
            return Ok(false);
        }

        let script = self.db.get_create_script(&self.table)?;
        let transactional = self.db.dialect().supports_ddl_transactions();
        let connection = self.db.get_main_connection()?;
        connection.with_raw(|raw| -> rusqlite::Result<()> {
            let conn = raw.inner_mut();
            if transactional {
                let tx = conn.transaction()?;
                for statement in script.statements() {
                    tx.execute_batch(&statement.sql)?;
                }
                tx.commit()
            } else {
                for statement in script.statements() {
                    conn.execute_batch(&statement.sql)?;
                }
                Ok(())
            }
        })?;

        info!(table = %self.table, "created schema history table");
        Ok(true)
    }

    /// Highest installed rank, or `None` for an empty table.
    pub fn max_installed_rank(&self) -> Result<Option<i64>> {
        let sql = format!(
            "SELECT MAX({}) FROM {}",
            self.db.quote(&["installed_rank"]),
            self.table
        );
        let connection = self.db.get_main_connection()?;
        let rank = connection.with_raw(|raw| raw.inner().query_row(&sql, [], |row| row.get(0)))?;
        Ok(rank)
    }

    /// Appends `record` with the next installed rank and returns that rank.
    pub fn append(&self, record: &MigrationRecord) -> Result<i64> {
        let rank = self.max_installed_rank()?.unwrap_or(0) + 1;
        let sql = self.db.get_insert_statement(&self.table);
        let connection = self.db.get_main_connection()?;
        connection.with_raw(|raw| {
            raw.inner().execute(
                &sql,
                params![
                    rank,
                    record.version,
                    record.description,
                    record.migration_type,
                    record.script,
                    record.checksum,
                    record.installed_by,
                    record.execution_time,
                    record.success,
                ],
            )
        })?;
        debug!(rank, script = %record.script, success = record.success, "recorded migration");
        Ok(rank)
    }

    /// Rows with an installed rank above `watermark`, oldest first.
    pub fn applied_since(&self, watermark: i64) -> Result<Vec<AppliedMigration>> {
        let sql = self.db.get_select_statement(&self.table, watermark);
        let connection = self.db.get_main_connection()?;
        let rows = connection.with_raw(|raw| -> rusqlite::Result<Vec<RawRow>> {
            let mut stmt = raw.inner().prepare(&sql)?;
            let rows = stmt.query_map([], RawRow::from_row)?;
            rows.collect()
        })?;
        rows.into_iter().map(RawRow::into_applied).collect()
    }

    pub fn status(&self) -> Result<HistoryStatus> {
        let exists = self.exists()?;
        let (entries, last_rank) = if exists {
            let rows = self.applied_since(-1)?;
            (rows.len(), rows.last().map(|row| row.installed_rank))
        } else {
            (0, None)
        };
        Ok(HistoryStatus {
            table: self.table.to_string(),
            exists,
            entries,
            last_rank,
        })
    }

    /// Runs `resource` on the migration connection and records the outcome.
    ///
    /// The script runs in a single transaction when the dialect supports
    /// transactional DDL, so a failing script leaves no partial changes. A
    /// failed script is recorded with `success = false` before the error is
    /// returned.
    pub fn apply(
        &self,
        resource: &Resource,
        version: Option<&str>,
        description: &str,
    ) -> Result<i64> {
        let installed_by = self.installed_by()?;
        let started = Instant::now();
        let outcome = if self.db.dialect().supports_ddl_transactions() {
            self.execute_in_transaction(resource)
        } else {
            self.db.execute_script(resource)
        };
        let execution_time = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

        let record = MigrationRecord {
            version: version.map(str::to_string),
            description: description.to_string(),
            migration_type: "SQL".to_string(),
            script: resource.filename(),
            checksum: None,
            installed_by,
            execution_time,
            success: outcome.is_ok(),
        };
        let rank = self.append(&record)?;

        match outcome {
            Ok(statements) => {
                info!(rank, script = %record.script, statements, "applied script");
                Ok(rank)
            }
            Err(err) => {
                warn!(rank, script = %record.script, "script failed: {err}");
                Err(err.into())
            }
        }
    }
}

impl SchemaHistory<'_> {
    /// The configured `installed_by`, else the database user.
    fn installed_by(&self) -> Result<String> {
        match &self.db.config().installed_by {
            Some(user) => Ok(user.clone()),
            None => Ok(self.db.get_current_user()?),
        }
    }

    fn execute_in_transaction(&self, resource: &Resource) -> schema_history_db::Result<usize> {
        let connection = self.db.get_migration_connection()?;
        connection.execute("BEGIN")?;
        match self.db.execute_script(resource) {
            Ok(statements) => {
                connection.execute("COMMIT")?;
                Ok(statements)
            }
            Err(err) => {
                if let Err(rollback_err) = connection.execute("ROLLBACK") {
                    warn!("error while rolling back failed script: {rollback_err}");
                }
                Err(err)
            }
        }
    }
}

/// Columns as stored, before `installed_on` is parsed.
struct RawRow {
    installed_rank: i64,
    version: Option<String>,
    description: String,
    migration_type: String,
    script: String,
    checksum: Option<i32>,
    installed_on: String,
    installed_by: String,
    execution_time: i64,
    success: bool,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            installed_rank: row.get(0)?,
            version: row.get(1)?,
            description: row.get(2)?,
            migration_type: row.get(3)?,
            script: row.get(4)?,
            checksum: row.get(5)?,
            installed_on: row.get(6)?,
            installed_by: row.get(7)?,
            execution_time: row.get(8)?,
            success: row.get(9)?,
        })
    }

    fn into_applied(self) -> Result<AppliedMigration> {
        let installed_on = NaiveDateTime::parse_from_str(&self.installed_on, INSTALLED_ON_FORMAT)
            .map_err(|e| {
                SqliteError::ConversionError(format!(
                    "invalid installed_on '{}' for rank {}: {e}",
                    self.installed_on, self.installed_rank
                ))
            })?;
        Ok(AppliedMigration {
            installed_rank: self.installed_rank,
            version: self.version,
            description: self.description,
            migration_type: self.migration_type,
            script: self.script,
            checksum: self.checksum,
            installed_on,
            installed_by: self.installed_by,
            execution_time: self.execution_time,
            success: self.success,
        })
    }
}

#[cfg(test)]
mod tests {
    use schema_history_db::DatabaseConfig;

    use super::*;

    fn memory_db() -> Database<SqliteSource> {
        Database::connect(DatabaseConfig::default(), SqliteSource::in_memory()).unwrap()
    }

    fn record(script: &str) -> MigrationRecord {
        MigrationRecord {
            version: Some("1".into()),
            description: "init".into(),
            migration_type: "SQL".into(),
            script: script.into(),
            checksum: Some(12345),
            installed_by: "tester".into(),
            execution_time: 7,
            success: true,
        }
    }

    #[test]
    fn test_create_is_idempotent() {
        let db = memory_db();
        let history = SchemaHistory::new(&db).unwrap();
        assert!(!history.exists().unwrap());
        assert!(history.create().unwrap());
        assert!(history.exists().unwrap());
        assert!(!history.create().unwrap());
    }

    #[test]
    fn test_table_defaults_to_main_schema() {
        let db = memory_db();
        let history = SchemaHistory::new(&db).unwrap();
        assert_eq!(history.table().quoted(), r#""main"."schema_history""#);
    }

    #[test]
    fn test_append_assigns_increasing_ranks() {
        let db = memory_db();
        let history = SchemaHistory::new(&db).unwrap();
        history.create().unwrap();
        assert_eq!(history.max_installed_rank().unwrap(), None);
        assert_eq!(history.append(&record("V1__a.sql")).unwrap(), 1);
        assert_eq!(history.append(&record("V2__b.sql")).unwrap(), 2);
        assert_eq!(history.max_installed_rank().unwrap(), Some(2));
    }

    #[test]
    fn test_applied_since_respects_watermark() {
        let db = memory_db();
        let history = SchemaHistory::new(&db).unwrap();
        history.create().unwrap();
        for script in ["V1__a.sql", "V2__b.sql", "V3__c.sql"] {
            history.append(&record(script)).unwrap();
        }

        let all = history.applied_since(-1).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].checksum, Some(12345));
        assert!(all[0].success);

        let newer = history.applied_since(1).unwrap();
        let scripts: Vec<&str> = newer.iter().map(|row| row.script.as_str()).collect();
        assert_eq!(scripts, vec!["V2__b.sql", "V3__c.sql"]);
        assert!(history.applied_since(3).unwrap().is_empty());
    }

    #[test]
    fn test_status_of_missing_table() {
        let db = memory_db();
        let status = SchemaHistory::new(&db).unwrap().status().unwrap();
        assert!(!status.exists);
        assert_eq!(status.entries, 0);
        assert_eq!(status.last_rank, None);
    }

    #[test]
    fn test_installed_on_format() {
        let parsed = NaiveDateTime::parse_from_str("2026-10-19 08:15:30.125", INSTALLED_ON_FORMAT);
        assert!(parsed.is_ok());
    }
}
