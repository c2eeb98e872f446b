//! `${name}` placeholder expansion for SQL templates.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CoreError, Result};

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z0-9_.\-]+)\}").expect("static regex must compile")
});

/// Placeholder values keyed by name.
pub type Placeholders = HashMap<String, String>;

/// Replaces every `${name}` in `template` with its value.
///
/// # Errors
///
/// Returns [`CoreError::MissingPlaceholder`] for the first placeholder that
/// has no value.
///
/// # Examples
///
/// ```
/// use schema_history_core::{Placeholders, expand_placeholders};
///
/// let mut values = Placeholders::new();
/// values.insert("table".into(), "history".into());
/// let sql = expand_placeholders("CREATE INDEX \"${table}_idx\"", &values).unwrap();
/// assert_eq!(sql, "CREATE INDEX \"history_idx\"");
/// ```
pub fn expand_placeholders(template: &str, placeholders: &Placeholders) -> Result<String> {
    let mut expanded = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let name = name.as_str();
        let value = placeholders
            .get(name)
            .ok_or_else(|| CoreError::MissingPlaceholder(name.to_string()))?;
        expanded.push_str(&template[last..whole.start()]);
        expanded.push_str(value);
        last = whole.end();
    }
    expanded.push_str(&template[last..]);

    Ok(expanded)
}
