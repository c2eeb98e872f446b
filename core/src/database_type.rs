//! Database engine families.
//!
//! [`DatabaseType`] is the registry key used to select a dialect. It can be
//! derived from the product name an engine reports in its metadata, or parsed
//! from a short identifier such as `postgres` or `mssql`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The engine families with a dialect implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    Postgresql,
    Mysql,
    Sqlserver,
    Oracle,
    Sqlite,
}

impl DatabaseType {
    /// All known engine families, in registry order.
    pub const ALL: [DatabaseType; 5] = [
        DatabaseType::Postgresql,
        DatabaseType::Mysql,
        DatabaseType::Sqlserver,
        DatabaseType::Oracle,
        DatabaseType::Sqlite,
    ];

    /// Maps an engine-reported product name to its family.
    ///
    /// MariaDB reports itself separately but shares the MySQL dialect.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_history_core::DatabaseType;
    ///
    /// assert_eq!(
    ///     DatabaseType::from_product_name("Microsoft SQL Server"),
    ///     Some(DatabaseType::Sqlserver)
    /// );
    /// assert_eq!(DatabaseType::from_product_name("DB2/LINUXX8664"), None);
    /// ```
    pub fn from_product_name(product: &str) -> Option<Self> {
        let product = product.trim();
        if product.starts_with("PostgreSQL") {
            Some(DatabaseType::Postgresql)
        } else if product.starts_with("MySQL") || product.starts_with("MariaDB") {
            Some(DatabaseType::Mysql)
        } else if product.starts_with("Microsoft SQL Server") {
            Some(DatabaseType::Sqlserver)
        } else if product.starts_with("Oracle") {
            Some(DatabaseType::Oracle)
        } else if product.starts_with("SQLite") {
            Some(DatabaseType::Sqlite)
        } else {
            None
        }
    }

    /// Short lowercase identifier, accepted back by [`FromStr`].
    pub fn id(&self) -> &'static str {
        match self {
            DatabaseType::Postgresql => "postgresql",
            DatabaseType::Mysql => "mysql",
            DatabaseType::Sqlserver => "sqlserver",
            DatabaseType::Oracle => "oracle",
            DatabaseType::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatabaseType::Postgresql => "PostgreSQL",
            DatabaseType::Mysql => "MySQL",
            DatabaseType::Sqlserver => "SQL Server",
            DatabaseType::Oracle => "Oracle",
            DatabaseType::Sqlite => "SQLite",
        };
        f.write_str(name)
    }
}

impl FromStr for DatabaseType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DatabaseType::Postgresql),
            "mysql" | "mariadb" => Ok(DatabaseType::Mysql),
            "sqlserver" | "sql_server" | "mssql" => Ok(DatabaseType::Sqlserver),
            "oracle" => Ok(DatabaseType::Oracle),
            "sqlite" | "sqlite3" => Ok(DatabaseType::Sqlite),
            _ => Err(CoreError::UnknownDatabaseType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_product_name() {
        assert_eq!(
            DatabaseType::from_product_name("PostgreSQL"),
            Some(DatabaseType::Postgresql)
        );
        assert_eq!(
            DatabaseType::from_product_name("MariaDB"),
            Some(DatabaseType::Mysql)
        );
        assert_eq!(
            DatabaseType::from_product_name("Oracle"),
            Some(DatabaseType::Oracle)
        );
        assert_eq!(
            DatabaseType::from_product_name("SQLite"),
            Some(DatabaseType::Sqlite)
        );
        assert_eq!(DatabaseType::from_product_name("H2"), None);
    }

    #[test]
    fn test_parse_identifiers() {
        assert_eq!("pg".parse::<DatabaseType>().unwrap(), DatabaseType::Postgresql);
        assert_eq!("MSSQL".parse::<DatabaseType>().unwrap(), DatabaseType::Sqlserver);
        assert!("unknown".parse::<DatabaseType>().is_err());
    }

    #[test]
    fn test_id_round_trips_through_from_str() {
        for ty in DatabaseType::ALL {
            assert_eq!(ty.id().parse::<DatabaseType>().unwrap(), ty);
        }
    }
}
