use schema_history_core::{DatabaseType, Edition, Resource, Version};

use super::{Ceiling, Dialect, VersionPolicy};

const CREATE_SCRIPT: &str = r#"CREATE TABLE ${table_quoted} (
    "installed_rank" INT NOT NULL,
    "version" VARCHAR2(50),
    "description" VARCHAR2(200) NOT NULL,
    "type" VARCHAR2(20) NOT NULL,
    "script" VARCHAR2(1000) NOT NULL,
    "checksum" INT,
    "installed_by" VARCHAR2(100) NOT NULL,
    "installed_on" TIMESTAMP DEFAULT CURRENT_TIMESTAMP NOT NULL,
    "execution_time" INT NOT NULL,
    "success" NUMBER(1) NOT NULL,
    CONSTRAINT "${table}_pk" PRIMARY KEY ("installed_rank")
);

CREATE INDEX "${schema}"."${table}_s_idx" ON ${table_quoted} ("success");
"#;

/// Oracle Database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OracleDialect;

impl Dialect for OracleDialect {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Oracle
    }

    fn supports_ddl_transactions(&self) -> bool {
        false
    }

    fn supports_changing_current_schema(&self) -> bool {
        true
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
        Resource::named("createMetaDataTable.oracle.sql", CREATE_SCRIPT)
    }

    fn version_policy(&self) -> VersionPolicy {
        VersionPolicy {
            floor: Version::new(10, 0),
            edition_floor: Some((Version::new(12, 2), Edition::Enterprise)),
            ceiling: Some(Ceiling::Major(Version::new(23, 0))),
        }
    }

    fn current_user_query(&self) -> Option<&'static str> {
        Some("SELECT USER FROM DUAL")
    }

    fn current_schema_query(&self) -> Option<&'static str> {
        Some("SELECT SYS_CONTEXT('USERENV', 'CURRENT_SCHEMA') FROM DUAL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_booleans() {
        assert_eq!(OracleDialect.boolean_true(), "1");
        assert_eq!(OracleDialect.boolean_false(), "0");
    }

    #[test]
    fn test_ceiling_is_major_only() {
        let policy = OracleDialect.version_policy();
        assert_eq!(policy.ceiling, Some(Ceiling::Major(Version::new(23, 0))));
    }
}
