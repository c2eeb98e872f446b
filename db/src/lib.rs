//! Dialect-aware database abstraction for schema migrations.
//!
//! This crate insulates a migration engine from engine differences: identifier
//! quoting, boolean literals, DDL-transaction support, the schema/catalog
//! model, and which engine versions are supported. It owns the lifecycle of
//! the two connections a migration run needs and generates the SQL for the
//! schema-history table.
//!
//! Drivers plug in through [`ConnectionSource`], [`RawConnection`] and
//! [`DatabaseMetadata`].
//!
//! # Quick start
//!
//! ```no_run
//! use schema_history_db::{ConnectionSource, Database, DatabaseConfig, Result};
//!
//! fn run<S: ConnectionSource>(source: S) -> Result<()> {
//!     let db = Database::connect(DatabaseConfig::default(), source)?;
//!     db.ensure_supported()?;
//!
//!     let table = db.history_table()?;
//!     let create = db.get_create_script(&table)?;
//!     for statement in create.statements() {
//!         db.get_main_connection()?.execute(&statement.sql)?;
//!     }
//!
//!     let select = db.get_select_statement(&table, -1);
//!     println!("{select}");
//!     db.close();
//!     Ok(())
//! }
//! ```

mod config;
mod connection;
mod database;
mod dialect;
mod error;
mod executor;
mod history;
mod version_gate;

pub use config::{DEFAULT_CONNECT_RETRIES_INTERVAL, DEFAULT_TABLE, DatabaseConfig};
pub use connection::{
    Connection, ConnectionSource, DatabaseMetadata, RawConnection, open_with_retries,
};
pub use database::Database;
pub use dialect::{
    Ceiling, Dialect, DialectImpl, MysqlDialect, OracleDialect, PostgresDialect, SqlServerDialect,
    SqliteDialect, VersionPolicy,
};
pub use error::{BoxError, DatabaseError, Result};
pub use executor::{DefaultScriptExecutor, ScriptExecutor};
pub use history::{INSERT_COLUMNS, SELECT_COLUMNS, SchemaHistorySql};
pub use version_gate::{VersionGate, VersionWarning};
