use schema_history_core::{DatabaseType, Edition, Resource, Version};

use super::{Ceiling, Dialect, VersionPolicy};

const CREATE_SCRIPT: &str = r#"CREATE TABLE ${table_quoted} (
    "installed_rank" INT NOT NULL,
    "version" VARCHAR(50),
    "description" VARCHAR(200) NOT NULL,
    "type" VARCHAR(20) NOT NULL,
    "script" VARCHAR(1000) NOT NULL,
    "checksum" INTEGER,
    "installed_by" VARCHAR(100) NOT NULL,
    "installed_on" TIMESTAMP NOT NULL DEFAULT now(),
    "execution_time" INTEGER NOT NULL,
    "success" BOOLEAN NOT NULL
);
ALTER TABLE ${table_quoted} ADD CONSTRAINT "${table}_pk" PRIMARY KEY ("installed_rank");

CREATE INDEX "${table}_s_idx" ON ${table_quoted} ("success");
"#;

/// PostgreSQL and wire-compatible engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Postgresql
    }

    fn supports_ddl_transactions(&self) -> bool {
        true
    }

    fn supports_changing_current_schema(&self) -> bool {
        true
    }

    fn boolean_true(&self) -> &'static str {
        "TRUE"
    }

    fn boolean_false(&self) -> &'static str {
        "FALSE"
    }

    fn do_quote(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    fn catalog_is_schema(&self) -> bool {
        false
    }

    fn raw_create_script(&self) -> Resource {
        Resource::named("createMetaDataTable.postgresql.sql", CREATE_SCRIPT)
    }

    fn version_policy(&self) -> VersionPolicy {
        VersionPolicy {
            floor: Version::new(9, 0),
            edition_floor: Some((Version::new(9, 4), Edition::Enterprise)),
            ceiling: Some(Ceiling::Major(Version::new(17, 0))),
        }
    }

    fn current_user_query(&self) -> Option<&'static str> {
        Some("SELECT current_user")
    }

    fn current_schema_query(&self) -> Option<&'static str> {
        Some("SELECT current_schema()")
    }
}
