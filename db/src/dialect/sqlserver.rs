use schema_history_core::{DatabaseType, Delimiter, Edition, Resource, Version};

use super::{Ceiling, Dialect, VersionPolicy};

const CREATE_SCRIPT: &str = r#"CREATE TABLE ${table_quoted} (
    [installed_rank] INT NOT NULL,
    [version] NVARCHAR(50),
    [description] NVARCHAR(200),
    [type] NVARCHAR(20) NOT NULL,
    [script] NVARCHAR(1000) NOT NULL,
    [checksum] INT,
    [installed_by] NVARCHAR(100) NOT NULL,
    [installed_on] DATETIME NOT NULL DEFAULT GETDATE(),
    [execution_time] INT NOT NULL,
    [success] BIT NOT NULL
);
ALTER TABLE ${table_quoted} ADD CONSTRAINT [${table}_pk] PRIMARY KEY ([installed_rank]);

CREATE INDEX [${table}_s_idx] ON ${table_quoted} ([success]);
GO
"#;

/// Microsoft SQL Server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlserver
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
        format!("[{}]", identifier.replace(']', "]]"))
    }

    fn catalog_is_schema(&self) -> bool {
        false
    }

    fn raw_create_script(&self) -> Resource {
        Resource::named("createMetaDataTable.sqlserver.sql", CREATE_SCRIPT)
    }

    fn version_policy(&self) -> VersionPolicy {
        VersionPolicy {
            floor: Version::new(10, 0),
            edition_floor: Some((Version::new(12, 0), Edition::Enterprise)),
            ceiling: Some(Ceiling::Full(Version::new(16, 0))),
        }
    }

    fn default_delimiter(&self) -> Delimiter {
        Delimiter::GO
    }

    fn current_user_query(&self) -> Option<&'static str> {
        Some("SELECT SUSER_SNAME()")
    }

    fn current_schema_query(&self) -> Option<&'static str> {
        Some("SELECT SCHEMA_NAME()")
    }

    /// Marketing release names, e.g. `11.0` is `2012`.
    fn version_display_name(&self, version: &Version) -> String {
        let name = match (version.major(), version.minor()) {
            (10, 0) => "2008",
            (10, 50) | (10, 5) => "2008 R2",
            (11, _) => "2012",
            (12, _) => "2014",
            (13, _) => "2016",
            (14, _) => "2017",
            (15, _) => "2019",
            (16, _) => "2022",
            _ => return version.to_string(),
        };
        name.to_string()
    }
}
