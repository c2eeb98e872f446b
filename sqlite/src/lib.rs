//! SQLite driver for the schema-history database layer.
//!
//! This crate plugs [rusqlite] into
//! [`schema_history_db`](schema_history_db) and adds the operations a
//! migration engine performs on the schema-history table.
//!
//! # Architecture
//!
//! - **`driver`**: [`SqliteSource`], [`SqliteConnection`] and
//!   [`SqliteMetadata`], the driver collaborators
//! - **`history`**: [`SchemaHistory`]: create, append, read since a
//!   watermark, apply a script and record it
//!
//! SQLite is a single-connection dialect: history bookkeeping and script
//! execution share one connection.
//!
//! # Quick start
//!
//! ```no_run
//! use schema_history_core::Resource;
//! use schema_history_db::{Database, DatabaseConfig};
//! use schema_history_sqlite::{SchemaHistory, SqliteSource};
//!
//! let db = Database::connect(DatabaseConfig::default(), SqliteSource::file("app.db")).unwrap();
//! db.ensure_supported().unwrap();
//!
//! let history = SchemaHistory::new(&db).unwrap();
//! history.create().unwrap();
//! history
//!     .apply(&Resource::file("V1__init.sql"), Some("1"), "init")
//!     .unwrap();
//! db.close();
//! ```

mod driver;
mod error;
mod history;

pub use driver::{SqliteConnection, SqliteMetadata, SqliteSource};
pub use error::{Result, SqliteError};
pub use history::{AppliedMigration, HistoryStatus, MigrationRecord, SchemaHistory};
