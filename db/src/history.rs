//! SQL for the schema-history table.
//!
//! Column order of [`INSERT_COLUMNS`] and [`SELECT_COLUMNS`] is part of the
//! external contract: callers bind parameters and read rows by position.

use schema_history_core::{Placeholders, SqlScript, Table};

use crate::dialect::Dialect;
use crate::error::Result;

/// Columns written when recording an applied migration, in bind order.
pub const INSERT_COLUMNS: [&str; 9] = [
    "installed_rank",
    "version",
    "description",
    "type",
    "script",
    "checksum",
    "installed_by",
    "execution_time",
    "success",
];

/// Columns read back from the history table, in projection order.
pub const SELECT_COLUMNS: [&str; 10] = [
    "installed_rank",
    "version",
    "description",
    "type",
    "script",
    "checksum",
    "installed_on",
    "installed_by",
    "execution_time",
    "success",
];

/// Builds schema-history SQL for one dialect.
///
/// # Examples
///
/// ```
/// use schema_history_db::{PostgresDialect, SchemaHistorySql};
///
/// let sql = SchemaHistorySql::new(&PostgresDialect);
/// let table = sql.table("public", "schema_history");
/// assert!(sql.select_statement(&table, 5)
///     .ends_with(r#"WHERE "installed_rank" > 5 ORDER BY "installed_rank""#));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SchemaHistorySql<'a, D: Dialect> {
    dialect: &'a D,
}

impl<'a, D: Dialect> SchemaHistorySql<'a, D> {
    pub fn new(dialect: &'a D) -> Self {
        Self { dialect }
    }

    pub fn quote(&self, identifiers: &[&str]) -> String {
        self.dialect.quote(identifiers)
    }

    /// A table reference with its quoted form precomputed.
    pub fn table(&self, schema: &str, name: &str) -> Table {
        Table::new(schema, name, self.quote(&[schema, name]))
    }

    /// Expands the dialect's create-table template for `table`.
    pub fn create_script(&self, table: &Table) -> Result<SqlScript> {
        let mut placeholders = Placeholders::new();
        placeholders.insert("schema".to_string(), table.schema().to_string());
        placeholders.insert("table".to_string(), table.name().to_string());
        placeholders.insert("table_quoted".to_string(), table.quoted().to_string());
        self.dialect.create_script(&placeholders)
    }

    fn column_list(&self, columns: &[&str]) -> String {
        columns
            .iter()
            .map(|column| self.dialect.do_quote(column))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Insert with nine positional parameters, bound in [`INSERT_COLUMNS`]
    /// order.
    pub fn insert_statement(&self, table: &Table) -> String {
        format!(
            "INSERT INTO {table} ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.column_list(&INSERT_COLUMNS)
        )
    }

    /// Rows with `installed_rank` above `watermark`, in ascending rank order.
    pub fn select_statement(&self, table: &Table, watermark: i64) -> String {
        let rank = self.dialect.do_quote("installed_rank");
        format!(
            "SELECT {} FROM {table} WHERE {rank} > {watermark} ORDER BY {rank}",
            self.column_list(&SELECT_COLUMNS)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MysqlDialect, PostgresDialect, SqlServerDialect, SqliteDialect};

    #[test]
    fn test_insert_statement_is_exact() {
        let sql = SchemaHistorySql::new(&PostgresDialect);
        let table = sql.table("public", "schema_history");
        assert_eq!(
            sql.insert_statement(&table),
            r#"INSERT INTO "public"."schema_history" ("installed_rank","version","description","type","script","checksum","installed_by","execution_time","success") VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        );
    }

    #[test]
    fn test_select_statement_is_exact() {
        let sql = SchemaHistorySql::new(&PostgresDialect);
        let table = sql.table("public", "schema_history");
        assert_eq!(
            sql.select_statement(&table, 5),
            r#"SELECT "installed_rank","version","description","type","script","checksum","installed_on","installed_by","execution_time","success" FROM "public"."schema_history" WHERE "installed_rank" > 5 ORDER BY "installed_rank""#
        );
    }

    #[test]
    fn test_negative_watermark_selects_everything() {
        let sql = SchemaHistorySql::new(&SqliteDialect);
        let table = sql.table("main", "schema_history");
        assert!(sql.select_statement(&table, -1).contains(r#""installed_rank" > -1"#));
    }

    #[test]
    fn test_columns_use_dialect_quoting() {
        let sql = SchemaHistorySql::new(&MysqlDialect);
        let table = sql.table("app", "history");
        assert!(sql
            .insert_statement(&table)
            .starts_with("INSERT INTO `app`.`history` (`installed_rank`,`version`"));

        let sql = SchemaHistorySql::new(&SqlServerDialect);
        let table = sql.table("dbo", "history");
        assert!(sql
            .select_statement(&table, 0)
            .ends_with("FROM [dbo].[history] WHERE [installed_rank] > 0 ORDER BY [installed_rank]"));
    }

    #[test]
    fn test_table_is_quoted_once() {
        let sql = SchemaHistorySql::new(&PostgresDialect);
        let table = sql.table("my\"schema", "history");
        assert_eq!(table.quoted(), r#""my""schema"."history""#);
        assert!(sql.insert_statement(&table).starts_with(r#"INSERT INTO "my""schema"."history" ("#));
    }

    #[test]
    fn test_create_script_uses_table_placeholders() {
        let sql = SchemaHistorySql::new(&PostgresDialect);
        let table = sql.table("public", "schema_history");
        let script = sql.create_script(&table).unwrap();
        assert_eq!(script.len(), 3);
        assert!(script.statements()[0]
            .sql
            .starts_with(r#"CREATE TABLE "public"."schema_history" ("#));
        assert!(script.statements()[1].sql.contains(r#""schema_history_pk""#));
        assert!(script.statements()[2].sql.contains(r#""schema_history_s_idx""#));
    }

    #[test]
    fn test_sqlserver_create_script_is_one_batch() {
        let sql = SchemaHistorySql::new(&SqlServerDialect);
        let table = sql.table("dbo", "flyway");
        let script = sql.create_script(&table).unwrap();
        assert_eq!(script.len(), 1);
        assert!(script.statements()[0].sql.contains("[flyway_s_idx]"));
    }
}
