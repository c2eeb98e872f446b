//! The migration target: dialect, gated version and connection lifecycle.
//!
//! A [`Database`] is built from one raw connection. Its version is read once
//! at construction. The main connection (history bookkeeping) and the
//! migration connection (script execution) are created lazily on first access
//! and cached for the lifetime of the instance. Dialects that require a
//! single connection hand out the main connection for both roles.
//!
//! Lazy slots are [`OnceCell`]s, so `Database` is `!Sync`: first access can
//! not race across threads. Share it across threads by warming both
//! connections and moving it behind your own lock.

use std::cell::{OnceCell, RefCell};
use std::fmt;

use schema_history_core::{DatabaseType, Delimiter, Resource, SqlScript, Table, Version};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::connection::{
    Connection, ConnectionSource, DatabaseMetadata, RawConnection, close_quietly,
    open_with_retries,
};
use crate::dialect::{Dialect, DialectImpl};
use crate::error::{DatabaseError, Result};
use crate::executor::{DefaultScriptExecutor, ScriptExecutor};
use crate::history::SchemaHistorySql;
use crate::version_gate::{VersionGate, VersionWarning};

type Raw<S> = <S as ConnectionSource>::Connection;
type Metadata<S> = <Raw<S> as RawConnection>::Metadata;

/// A single migration target.
pub struct Database<S: ConnectionSource> {
    config: DatabaseConfig,
    data_source: S,
    gate: VersionGate,
    metadata: Metadata<S>,
    original_auto_commit: bool,
    /// Raw main connection until it is initialized and wrapped.
    main_raw: RefCell<Option<Raw<S>>>,
    main: OnceCell<Connection<Raw<S>>>,
    /// Dedicated migration connection; stays empty in single-connection mode.
    migration: OnceCell<Connection<Raw<S>>>,
    executor: Box<dyn ScriptExecutor<Raw<S>>>,
}

impl<S: ConnectionSource> Database<S> {
    /// Builds a database from an already-open raw connection.
    ///
    /// `original_auto_commit` is the connection's auto-commit state before
    /// this tool changed anything.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataUnavailable`](DatabaseError::MetadataUnavailable) if
    /// the product or version cannot be read, or
    /// [`UnknownDatabaseType`](schema_history_core::CoreError::UnknownDatabaseType)
    /// if no dialect handles the product. The raw connection is closed on
    /// failure.
    pub fn new(
        config: DatabaseConfig,
        data_source: S,
        connection: Raw<S>,
        original_auto_commit: bool,
    ) -> Result<Self> {
        let (metadata, gate) = match Self::identify(&connection) {
            Ok(identified) => identified,
            Err(err) => {
                if let Err(close_err) = connection.close() {
                    debug!("error while closing unidentified connection: {close_err}");
                }
                return Err(err);
            }
        };

        let dialect = gate.dialect();
        info!(
            "database: {} {}",
            dialect.database_type(),
            dialect.version_display_name(&gate.version())
        );

        Ok(Self {
            config,
            data_source,
            gate,
            metadata,
            original_auto_commit,
            main_raw: RefCell::new(Some(connection)),
            main: OnceCell::new(),
            migration: OnceCell::new(),
            executor: Box::new(DefaultScriptExecutor),
        })
    }

    fn identify(connection: &Raw<S>) -> Result<(Metadata<S>, VersionGate)> {
        const MESSAGE: &str = "unable to get metadata for connection";
        let metadata = connection
            .metadata()
            .map_err(|source| DatabaseError::metadata(MESSAGE, source))?;
        let product = metadata
            .product_name()
            .map_err(|source| DatabaseError::metadata(MESSAGE, source))?;
        let dialect = DialectImpl::from_product_name(&product)?;
        let gate = VersionGate::determine(dialect, &metadata)?;
        debug!(%product, version = %gate.version(), "identified database");
        Ok((metadata, gate))
    }

    /// Opens the first raw connection from `data_source` and builds the
    /// database from it.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionFailed`](DatabaseError::ConnectionFailed) once the
    /// configured retry budget is exhausted, plus the errors of
    /// [`Database::new`].
    pub fn connect(config: DatabaseConfig, data_source: S) -> Result<Self> {
        let connection = open_with_retries(
            &data_source,
            config.connect_retries,
            config.connect_retries_interval,
        )?;
        let auto_commit = match connection.auto_commit() {
            Ok(auto_commit) => auto_commit,
            Err(source) => {
                if let Err(close_err) = connection.close() {
                    debug!("error while closing connection: {close_err}");
                }
                return Err(DatabaseError::metadata(
                    "unable to determine the auto-commit state of the connection",
                    source,
                ));
            }
        };
        Self::new(config, data_source, connection, auto_commit)
    }

    /// Replaces the delegate that runs initialization SQL and scripts.
    pub fn with_script_executor(mut self, executor: impl ScriptExecutor<Raw<S>> + 'static) -> Self {
        self.executor = Box::new(executor);
        self
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn data_source(&self) -> &S {
        &self.data_source
    }

    pub fn dialect(&self) -> DialectImpl {
        self.gate.dialect()
    }

    pub fn database_type(&self) -> DatabaseType {
        self.gate.dialect().database_type()
    }

    /// Engine version, read once at construction.
    pub fn version(&self) -> Version {
        self.gate.version()
    }

    pub fn version_gate(&self) -> &VersionGate {
        &self.gate
    }

    /// Auto-commit state of the first connection before this tool touched it.
    pub fn original_auto_commit(&self) -> bool {
        self.original_auto_commit
    }

    /// Applies the dialect's version policy.
    ///
    /// # Errors
    ///
    /// Returns the floor violation, if any. An engine newer than the newest
    /// tested release yields a logged [`VersionWarning`] instead.
    pub fn ensure_supported(&self) -> Result<Option<VersionWarning>> {
        self.gate.ensure_supported()
    }

    fn run_init_sql(&self, raw: &mut Raw<S>) -> Result<()> {
        let Some(sql) = self.config.init_sql() else {
            return Ok(());
        };
        let script = SqlScript::from_sql("<init_sql>", sql, &self.default_delimiter());
        debug!(statements = script.len(), "running initialization SQL");
        self.executor.execute(raw, &script)
    }

    /// The connection used for schema-history reads and writes.
    ///
    /// The first call runs the configured initialization SQL on the raw
    /// connection and wraps it; later calls return the cached wrapper.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptExecutionFailure`](DatabaseError::ScriptExecutionFailure)
    /// if initialization SQL fails. The raw connection is kept so a later
    /// call can try again.
    pub fn get_main_connection(&self) -> Result<&Connection<Raw<S>>> {
        if let Some(connection) = self.main.get() {
            return Ok(connection);
        }

        let mut raw = self
            .main_raw
            .borrow_mut()
            .take()
            .ok_or(DatabaseError::ConnectionClosed)?;
        if let Err(err) = self.run_init_sql(&mut raw) {
            *self.main_raw.borrow_mut() = Some(raw);
            return Err(err);
        }

        let wrapped = self.dialect().connection(raw, self.original_auto_commit);
        debug!(database_type = %self.database_type(), "main connection ready");
        Ok(self.main.get_or_init(|| wrapped))
    }

    /// The connection used to apply migration scripts.
    ///
    /// In single-connection mode this is the main connection. Otherwise the
    /// first call opens a second raw connection within the configured retry
    /// budget and initializes it.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionFailed`](DatabaseError::ConnectionFailed) when the
    /// retry budget is exhausted, or
    /// [`ScriptExecutionFailure`](DatabaseError::ScriptExecutionFailure) if
    /// initialization SQL fails.
    pub fn get_migration_connection(&self) -> Result<&Connection<Raw<S>>> {
        if self.dialect().use_single_connection() {
            return self.get_main_connection();
        }
        if let Some(connection) = self.migration.get() {
            return Ok(connection);
        }

        let mut raw = open_with_retries(
            &self.data_source,
            self.config.connect_retries,
            self.config.connect_retries_interval,
        )?;
        if let Err(err) = self.run_init_sql(&mut raw) {
            close_quietly(raw, self.database_type());
            return Err(err);
        }

        let wrapped = self.dialect().connection(raw, self.original_auto_commit);
        debug!(database_type = %self.database_type(), "migration connection ready");
        Ok(self.migration.get_or_init(|| wrapped))
    }

    /// The user the main connection is authenticated as.
    ///
    /// # Errors
    ///
    /// Any failure is reported as
    /// [`MetadataUnavailable`](DatabaseError::MetadataUnavailable).
    pub fn get_current_user(&self) -> Result<String> {
        const MESSAGE: &str = "error retrieving the database user";
        if let Some(query) = self.dialect().current_user_query() {
            let connection = self
                .get_main_connection()
                .map_err(|err| DatabaseError::metadata(MESSAGE, Box::new(err)))?;
            let user = connection
                .with_raw(|raw| raw.query_string(query))
                .map_err(|source| DatabaseError::metadata(MESSAGE, source))?;
            if let Some(user) = user {
                return Ok(user);
            }
        }
        self.metadata
            .user_name()
            .map_err(|source| DatabaseError::metadata(MESSAGE, source))
    }

    pub fn quote(&self, identifiers: &[&str]) -> String {
        self.dialect().quote(identifiers)
    }

    /// A table reference quoted for this database.
    pub fn table(&self, schema: &str, name: &str) -> Table {
        SchemaHistorySql::new(&self.dialect()).table(schema, name)
    }

    /// The configured schema-history table.
    ///
    /// Falls back to the main connection's current schema when no schema is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns [`NoDefaultSchema`](DatabaseError::NoDefaultSchema) if neither
    /// is available.
    pub fn history_table(&self) -> Result<Table> {
        let schema = match &self.config.schema {
            Some(schema) => schema.clone(),
            None => self
                .get_main_connection()?
                .current_schema()?
                .ok_or(DatabaseError::NoDefaultSchema)?,
        };
        Ok(self.table(&schema, &self.config.table))
    }

    pub fn get_create_script(&self, table: &Table) -> Result<SqlScript> {
        SchemaHistorySql::new(&self.dialect()).create_script(table)
    }

    pub fn get_insert_statement(&self, table: &Table) -> String {
        SchemaHistorySql::new(&self.dialect()).insert_statement(table)
    }

    pub fn get_select_statement(&self, table: &Table, watermark: i64) -> String {
        SchemaHistorySql::new(&self.dialect()).select_statement(table, watermark)
    }

    pub fn default_delimiter(&self) -> Delimiter {
        self.dialect().default_delimiter()
    }

    /// Parses `resource` with the dialect's delimiter and runs it on the
    /// migration connection. Returns the number of statements executed.
    pub fn execute_script(&self, resource: &Resource) -> Result<usize> {
        let script = SqlScript::parse(resource, &self.default_delimiter())?;
        let connection = self.get_migration_connection()?;
        connection.with_raw(|raw| self.executor.execute(raw, &script))?;
        Ok(script.len())
    }

    /// Closes the migration connection, then the main connection.
    ///
    /// A shared connection is closed once. Close failures are logged, never
    /// returned.
    pub fn close(self) {
        let database_type = self.database_type();
        let Database {
            main_raw,
            main,
            migration,
            ..
        } = self;

        if let Some(connection) = migration.into_inner() {
            connection.close();
        }
        match main.into_inner() {
            Some(connection) => connection.close(),
            None => {
                if let Some(raw) = main_raw.into_inner() {
                    close_quietly(raw, database_type);
                }
            }
        }
    }
}

impl<S: ConnectionSource> fmt::Debug for Database<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("database_type", &self.database_type())
            .field("version", &self.version())
            .field("original_auto_commit", &self.original_auto_commit)
            .field("main_open", &self.main.get().is_some())
            .field("migration_open", &self.migration.get().is_some())
            .finish_non_exhaustive()
    }
}
