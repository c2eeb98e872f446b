use schema_history_core::{DatabaseType, Resource, Version};

use super::{Ceiling, Dialect, VersionPolicy};

const CREATE_SCRIPT: &str = r#"CREATE TABLE ${table_quoted} (
    "installed_rank" INT NOT NULL PRIMARY KEY,
    "version" VARCHAR(50),
    "description" VARCHAR(200) NOT NULL,
    "type" VARCHAR(20) NOT NULL,
    "script" VARCHAR(1000) NOT NULL,
    "checksum" INT,
    "installed_by" VARCHAR(100) NOT NULL,
    "installed_on" TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now')),
    "execution_time" INT NOT NULL,
    "success" BOOLEAN NOT NULL
);

CREATE INDEX "${schema}"."${table}_s_idx" ON "${table}" ("success");
"#;

/// SQLite.
///
/// A second connection to a file-backed database would deadlock on the
/// write lock held by the first, so history bookkeeping and migrations
/// share one connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn supports_ddl_transactions(&self) -> bool {
        true
    }

    fn supports_changing_current_schema(&self) -> bool {
        false
    }

    fn boolean_true(&self) -> &'static str {
        "1"
    }

    fn boolean_false(&self) -> &'static str {
        "0"
    }

    fn do_quote(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    fn catalog_is_schema(&self) -> bool {
        false
    }

    fn raw_create_script(&self) -> Resource {
        Resource::named("createMetaDataTable.sqlite.sql", CREATE_SCRIPT)
    }

    fn version_policy(&self) -> VersionPolicy {
        VersionPolicy {
            floor: Version::new(3, 7),
            edition_floor: None,
            ceiling: Some(Ceiling::Major(Version::new(3, 0))),
        }
    }

    fn current_schema_query(&self) -> Option<&'static str> {
        Some("SELECT name FROM pragma_database_list WHERE seq = 0")
    }

    fn use_single_connection(&self) -> bool {
        true
    }
}
