//! Per-engine dialects.
//!
//! Each engine family implements [`Dialect`]: identifier quoting, boolean
//! literals, DDL-transaction and schema-switch support, the schema/catalog
//! model, its supported version range and the create-table template for the
//! schema-history table.
//!
//! [`DialectImpl`] is the registry. It is selected by [`DatabaseType`] and
//! dispatches statically with a `match`, so adding an engine family is a
//! compile-checked change:
//!
//! 1. Create a module under `dialect/` with a unit struct implementing
//!    [`Dialect`].
//! 2. Add a [`DatabaseType`] variant and a [`DialectImpl`] variant.
//! 3. Extend [`DialectImpl::for_type`] and the `dispatch!` macro.

mod mysql;
mod oracle;
mod postgres;
mod sqlite;
mod sqlserver;

pub use mysql::MysqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

use schema_history_core::{
    DatabaseType, Delimiter, Edition, Placeholders, Resource, SqlScript, Version,
    expand_placeholders,
};

use crate::connection::{Connection, RawConnection};
use crate::error::{DatabaseError, Result};

/// Newest engine version a build has been tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ceiling {
    /// Warn when the engine is strictly newer on `(major, minor)`.
    Full(Version),
    /// Warn when the engine's major version is newer; minor is ignored.
    Major(Version),
}

/// Supported version range of an engine family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionPolicy {
    /// Oldest version any edition supports.
    pub floor: Version,
    /// Oldest version this edition supports, and the edition that still
    /// supports anything between `floor` and this.
    pub edition_floor: Option<(Version, Edition)>,
    /// Newest tested version; newer engines get an advisory warning.
    pub ceiling: Option<Ceiling>,
}

/// Capability set of one engine family.
pub trait Dialect {
    fn database_type(&self) -> DatabaseType;

    /// Whether DDL statements take part in transactions.
    fn supports_ddl_transactions(&self) -> bool;

    /// Whether a connection's current schema can be switched.
    fn supports_changing_current_schema(&self) -> bool;

    /// Literal for `true` in a boolean column.
    fn boolean_true(&self) -> &'static str;

    /// Literal for `false` in a boolean column.
    fn boolean_false(&self) -> &'static str;

    /// Quotes a single identifier.
    fn do_quote(&self, identifier: &str) -> String;

    /// Whether the engine models schemas as catalogs.
    fn catalog_is_schema(&self) -> bool;

    /// Unexpanded create-table template for the schema-history table, with
    /// `${schema}`, `${table}` and `${table_quoted}` placeholders.
    fn raw_create_script(&self) -> Resource;

    fn version_policy(&self) -> VersionPolicy;

    /// Oldest version any edition supports.
    fn oldest_supported_version(&self) -> Version {
        self.version_policy().floor
    }

    /// Quotes each identifier and joins them with `.`.
    ///
    /// Zero identifiers yield an empty string.
    fn quote(&self, identifiers: &[&str]) -> String {
        identifiers
            .iter()
            .map(|identifier| self.do_quote(identifier))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Expands the create-table template and splits it into statements.
    fn create_script(&self, placeholders: &Placeholders) -> Result<SqlScript> {
        let resource = self.raw_create_script();
        let template = resource.read()?;
        let sql = expand_placeholders(&template, placeholders)?;
        Ok(SqlScript::from_sql(
            resource.filename(),
            &sql,
            &self.default_delimiter(),
        ))
    }

    fn default_delimiter(&self) -> Delimiter {
        Delimiter::SEMICOLON
    }

    /// Query returning the current user, when metadata alone is not enough.
    fn current_user_query(&self) -> Option<&'static str> {
        None
    }

    /// Query returning the connection's current schema.
    fn current_schema_query(&self) -> Option<&'static str> {
        None
    }

    /// User-facing name of an engine version.
    fn version_display_name(&self, version: &Version) -> String {
        version.to_string()
    }

    /// Whether history bookkeeping and migrations share one connection.
    fn use_single_connection(&self) -> bool {
        false
    }

    /// Wraps an initialized raw connection.
    fn connection<C: RawConnection>(&self, raw: C, original_auto_commit: bool) -> Connection<C> {
        Connection::new(
            raw,
            self.database_type(),
            self.current_schema_query(),
            original_auto_commit,
        )
    }
}

/// Registry of dialects, one variant per engine family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectImpl {
    Postgresql(PostgresDialect),
    Mysql(MysqlDialect),
    Sqlserver(SqlServerDialect),
    Oracle(OracleDialect),
    Sqlite(SqliteDialect),
}

macro_rules! dispatch {
    ($self:ident, $d:ident => $body:expr) => {
        match $self {
            DialectImpl::Postgresql($d) => $body,
            DialectImpl::Mysql($d) => $body,
            DialectImpl::Sqlserver($d) => $body,
            DialectImpl::Oracle($d) => $body,
            DialectImpl::Sqlite($d) => $body,
        }
    };
}

impl DialectImpl {
    pub fn for_type(database_type: DatabaseType) -> Self {
        match database_type {
            DatabaseType::Postgresql => DialectImpl::Postgresql(PostgresDialect),
            DatabaseType::Mysql => DialectImpl::Mysql(MysqlDialect),
            DatabaseType::Sqlserver => DialectImpl::Sqlserver(SqlServerDialect),
            DatabaseType::Oracle => DialectImpl::Oracle(OracleDialect),
            DatabaseType::Sqlite => DialectImpl::Sqlite(SqliteDialect),
        }
    }

    /// Selects the dialect for an engine-reported product name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownDatabaseType` if no dialect handles the product.
    pub fn from_product_name(product: &str) -> Result<Self> {
        DatabaseType::from_product_name(product)
            .map(Self::for_type)
            .ok_or_else(|| {
                DatabaseError::Core(schema_history_core::CoreError::UnknownDatabaseType(
                    product.to_string(),
                ))
            })
    }

    /// Selects the dialect for a short identifier such as `pg` or `mssql`.
    pub fn from_id(id: &str) -> Result<Self> {
        Ok(Self::for_type(id.parse()?))
    }
}

impl Dialect for DialectImpl {
    fn database_type(&self) -> DatabaseType {
        dispatch!(self, d => d.database_type())
    }

    fn supports_ddl_transactions(&self) -> bool {
        dispatch!(self, d => d.supports_ddl_transactions())
    }

    fn supports_changing_current_schema(&self) -> bool {
        dispatch!(self, d => d.supports_changing_current_schema())
    }

    fn boolean_true(&self) -> &'static str {
        dispatch!(self, d => d.boolean_true())
    }

    fn boolean_false(&self) -> &'static str {
        dispatch!(self, d => d.boolean_false())
    }

    fn do_quote(&self, identifier: &str) -> String {
        dispatch!(self, d => d.do_quote(identifier))
    }

    fn catalog_is_schema(&self) -> bool {
        dispatch!(self, d => d.catalog_is_schema())
    }

    fn raw_create_script(&self) -> Resource {
        dispatch!(self, d => d.raw_create_script())
    }

    fn version_policy(&self) -> VersionPolicy {
        dispatch!(self, d => d.version_policy())
    }

    fn create_script(&self, placeholders: &Placeholders) -> Result<SqlScript> {
        dispatch!(self, d => d.create_script(placeholders))
    }

    fn default_delimiter(&self) -> Delimiter {
        dispatch!(self, d => d.default_delimiter())
    }

    fn current_user_query(&self) -> Option<&'static str> {
        dispatch!(self, d => d.current_user_query())
    }

    fn current_schema_query(&self) -> Option<&'static str> {
        dispatch!(self, d => d.current_schema_query())
    }

    fn version_display_name(&self, version: &Version) -> String {
        dispatch!(self, d => d.version_display_name(version))
    }

    fn use_single_connection(&self) -> bool {
        dispatch!(self, d => d.use_single_connection())
    }

    fn connection<C: RawConnection>(&self, raw: C, original_auto_commit: bool) -> Connection<C> {
        dispatch!(self, d => d.connection(raw, original_auto_commit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_database_type() {
        for ty in DatabaseType::ALL {
            assert_eq!(DialectImpl::for_type(ty).database_type(), ty);
        }
    }

    #[test]
    fn test_from_product_name() {
        let dialect = DialectImpl::from_product_name("Microsoft SQL Server").unwrap();
        assert_eq!(dialect, DialectImpl::Sqlserver(SqlServerDialect));
        assert!(DialectImpl::from_product_name("Informix").is_err());
    }

    #[test]
    fn test_from_id() {
        assert_eq!(
            DialectImpl::from_id("pg").unwrap(),
            DialectImpl::Postgresql(PostgresDialect)
        );
        assert!(DialectImpl::from_id("nosuchdb").is_err());
    }

    #[test]
    fn test_quote_joins_with_dot() {
        let pg = DialectImpl::for_type(DatabaseType::Postgresql);
        assert_eq!(pg.quote(&["public", "schema_history"]), "\"public\".\"schema_history\"");
        assert_eq!(pg.quote(&["only"]), "\"only\"");
        assert_eq!(pg.quote(&[]), "");
    }

    #[test]
    fn test_quote_is_join_of_do_quote_for_every_dialect() {
        let ids = ["a", "b\"c", "d`e", "f]g", "h"];
        for ty in DatabaseType::ALL {
            let dialect = DialectImpl::for_type(ty);
            for n in 1..=ids.len() {
                let expected = ids[..n]
                    .iter()
                    .map(|id| dialect.do_quote(id))
                    .collect::<Vec<_>>()
                    .join(".");
                assert_eq!(dialect.quote(&ids[..n]), expected, "{ty}");
            }
        }
    }

    #[test]
    fn test_version_floors_do_not_exceed_edition_floors() {
        for ty in DatabaseType::ALL {
            let policy = DialectImpl::for_type(ty).version_policy();
            if let Some((edition_floor, _)) = policy.edition_floor {
                assert!(edition_floor.is_at_least(&policy.floor), "{ty}");
            }
        }
    }

    #[test]
    fn test_create_templates_expand_for_every_dialect() {
        for ty in DatabaseType::ALL {
            let dialect = DialectImpl::for_type(ty);
            let mut placeholders = Placeholders::new();
            placeholders.insert("schema".into(), "app".into());
            placeholders.insert("table".into(), "history".into());
            placeholders.insert("table_quoted".into(), dialect.quote(&["app", "history"]));

            let script = dialect.create_script(&placeholders).unwrap();
            assert!(!script.is_empty(), "{ty}");
            let all_sql: String = script.statements().iter().map(|s| s.sql.as_str()).collect();
            assert!(!all_sql.contains("${"), "{ty}: unexpanded placeholder");
            assert!(all_sql.contains(&dialect.quote(&["app", "history"])), "{ty}");
            for column in crate::history::SELECT_COLUMNS {
                assert!(all_sql.contains(column), "{ty}: missing column {column}");
            }
        }
    }
}
