use schema_history_core::{DatabaseType, Edition, Resource, Version};

use super::{Ceiling, Dialect, VersionPolicy};

const CREATE_SCRIPT: &str = r#"CREATE TABLE ${table_quoted} (
    `installed_rank` INT NOT NULL,
    `version` VARCHAR(50),
    `description` VARCHAR(200) NOT NULL,
    `type` VARCHAR(20) NOT NULL,
    `script` VARCHAR(1000) NOT NULL,
    `checksum` INT,
    `installed_by` VARCHAR(100) NOT NULL,
    `installed_on` TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    `execution_time` INT NOT NULL,
    `success` BOOL NOT NULL,
    CONSTRAINT `${table}_pk` PRIMARY KEY (`installed_rank`)
) ENGINE=InnoDB;

CREATE INDEX `${table}_s_idx` ON ${table_quoted} (`success`);
"#;

/// MySQL and MariaDB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MysqlDialect;

impl Dialect for MysqlDialect {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Mysql
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
        format!("`{}`", identifier.replace('`', "``"))
    }

    // Schemas and databases are the same thing.
    fn catalog_is_schema(&self) -> bool {
        true
    }

    fn raw_create_script(&self) -> Resource {
        Resource::named("createMetaDataTable.mysql.sql", CREATE_SCRIPT)
    }

    fn version_policy(&self) -> VersionPolicy {
        VersionPolicy {
            floor: Version::new(5, 1),
            edition_floor: Some((Version::new(5, 7), Edition::Enterprise)),
            ceiling: Some(Ceiling::Full(Version::new(8, 4))),
        }
    }

    /// `USER()` returns `user@host`; only the user part is wanted.
    fn current_user_query(&self) -> Option<&'static str> {
        Some("SELECT SUBSTRING_INDEX(USER(),'@',1)")
    }

    fn current_schema_query(&self) -> Option<&'static str> {
        Some("SELECT DATABASE()")
    }
}
