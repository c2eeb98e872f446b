//! Fully-qualified table references.

use std::fmt;

/// An immutable reference to a table inside a schema.
///
/// The quoted form is computed once by whoever knows the dialect's quoting
/// rule and carried alongside the bare names, so generated SQL never quotes an
/// identifier twice.
///
/// # Examples
///
/// ```
/// use schema_history_core::Table;
///
/// let table = Table::new("public", "schema_history", r#""public"."schema_history""#);
/// assert_eq!(table.schema(), "public");
/// assert_eq!(table.to_string(), r#""public"."schema_history""#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Table {
    schema: String,
    name: String,
    quoted: String,
}

impl Table {
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        quoted: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            quoted: quoted.into(),
        }
    }

    /// Bare schema name.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Bare table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Quoted `schema.table` form, ready to splice into SQL.
    pub fn quoted(&self) -> &str {
        &self.quoted
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.quoted)
    }
}
