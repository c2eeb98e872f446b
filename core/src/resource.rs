//! SQL text sources.
//!
//! A [`Resource`] is either inline text (initialization SQL from the
//! configuration, built-in create-table templates) or a script on disk.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Inline or file-backed SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// Text held in memory under a descriptive name.
    Inline { name: String, content: String },
    /// A script read from disk on demand.
    File(PathBuf),
}

impl Resource {
    /// Inline text with a generic name.
    pub fn inline(content: impl Into<String>) -> Self {
        Self::named(String::from("<inline>"), content)
    }

    /// Inline text with a descriptive name used in error messages.
    pub fn named(name: impl Into<String>, content: impl Into<String>) -> Self {
        Resource::Inline {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn file(path: impl AsRef<Path>) -> Self {
        Resource::File(path.as_ref().to_path_buf())
    }

    /// Name recorded in the history table and shown in failures: the
    /// inline name, or the last component of the path.
    pub fn filename(&self) -> String {
        match self {
            Resource::Inline { name, .. } => name.clone(),
            Resource::File(path) => path
                .file_name()
                .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned()),
        }
    }

    /// Reads the full text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`](crate::CoreError::Io) if a file-backed
    /// resource cannot be read.
    pub fn read(&self) -> Result<Cow<'_, str>> {
        match self {
            Resource::Inline { content, .. } => Ok(Cow::Borrowed(content)),
            Resource::File(path) => Ok(Cow::Owned(std::fs::read_to_string(path)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_inline_resource() {
        let resource = Resource::inline("SELECT 1;");
        assert_eq!(resource.filename(), "<inline>");
        assert_eq!(resource.read().unwrap(), "SELECT 1;");
    }

    #[test]
    fn test_file_resource() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "CREATE TABLE t (id INT);").unwrap();

        let resource = Resource::file(file.path());
        let expected = file.path().file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(resource.filename(), expected);
        assert_eq!(resource.read().unwrap(), "CREATE TABLE t (id INT);");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let resource = Resource::file(dir.path().join("missing.sql"));
        assert_eq!(resource.filename(), "missing.sql");
        assert!(matches!(resource.read(), Err(crate::CoreError::Io(_))));
    }
}
