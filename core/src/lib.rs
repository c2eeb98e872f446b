//! Core value types for schema-history bookkeeping.
//!
//! This crate defines the dialect-independent building blocks used by the
//! database abstraction layer:
//!
//! - [`Version`]: the `major.minor` version an engine reports, with the
//!   comparison rules used for version floors and ceilings.
//! - [`Edition`]: product editions referenced when an engine version is only
//!   supported by a higher edition.
//! - [`DatabaseType`]: engine families, the registry key for dialects.
//! - [`Table`]: an immutable, pre-quoted table reference.
//! - [`Resource`]: inline or file-backed SQL text.
//! - [`SqlScript`] / [`Delimiter`]: statement splitting.
//! - [`expand_placeholders`]: `${name}` template expansion.
//!
//! # Example
//!
//! ```
//! use schema_history_core::*;
//!
//! let template = "CREATE TABLE ${table_quoted} (id INT);\nCREATE INDEX \"${table}_idx\" ON ${table_quoted} (id);";
//! let table = Table::new("public", "history", r#""public"."history""#);
//!
//! let mut placeholders = Placeholders::new();
//! placeholders.insert("schema".into(), table.schema().into());
//! placeholders.insert("table".into(), table.name().into());
//! placeholders.insert("table_quoted".into(), table.to_string());
//!
//! let sql = expand_placeholders(template, &placeholders).unwrap();
//! let script = SqlScript::from_sql("create", &sql, &Delimiter::SEMICOLON);
//! assert_eq!(script.len(), 2);
//! ```

mod database_type;
mod error;
mod placeholders;
mod resource;
mod script;
mod table;
mod version;

pub use database_type::DatabaseType;
pub use error::{CoreError, Result};
pub use placeholders::{Placeholders, expand_placeholders};
pub use resource::Resource;
pub use script::{Delimiter, SqlScript, SqlStatement};
pub use table::Table;
pub use version::{Edition, Version};
