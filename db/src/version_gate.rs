//! Engine version determination and gating.
//!
//! The version is read once from engine metadata. Floors are fatal: an engine
//! older than anything any edition supports fails with
//! [`UnsupportedDatabaseVersion`](DatabaseError::UnsupportedDatabaseVersion),
//! one that only a higher edition supports fails with
//! [`EditionUpgradeRequired`](DatabaseError::EditionUpgradeRequired).
//! Ceilings are advisory: an engine newer than the newest tested release is
//! logged and otherwise accepted.

use std::fmt;

use schema_history_core::{Edition, Version};
use tracing::warn;

use crate::connection::DatabaseMetadata;
use crate::dialect::{Ceiling, Dialect, DialectImpl};
use crate::error::{DatabaseError, Result};

/// Advisory emitted when the engine is newer than the newest tested release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionWarning {
    database: String,
    actual: String,
    newest_tested: String,
}

impl fmt::Display for VersionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} is newer than this version of the tool and support has not been tested; \
             the latest supported version of {} is {}",
            self.database, self.actual, self.database, self.newest_tested
        )
    }
}

/// Compares the engine version against the dialect's supported range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionGate {
    dialect: DialectImpl,
    version: Version,
}

impl VersionGate {
    pub fn new(dialect: DialectImpl, version: Version) -> Self {
        Self { dialect, version }
    }

    /// Reads the version from engine metadata.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataUnavailable`](DatabaseError::MetadataUnavailable) if
    /// either component cannot be read.
    pub fn determine(dialect: DialectImpl, metadata: &impl DatabaseMetadata) -> Result<Self> {
        const MESSAGE: &str = "unable to determine the version of the database";
        let major = metadata
            .major_version()
            .map_err(|source| DatabaseError::metadata(MESSAGE, source))?;
        let minor = metadata
            .minor_version()
            .map_err(|source| DatabaseError::metadata(MESSAGE, source))?;
        Ok(Self::new(dialect, Version::from_metadata(major, minor)))
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn dialect(&self) -> DialectImpl {
        self.dialect
    }

    fn display(&self, version: &Version) -> String {
        self.dialect.version_display_name(version)
    }

    /// Fails unless the engine is at least `floor`.
    pub fn ensure_database_is_recent_enough(&self, floor: &Version) -> Result<()> {
        if self.version.is_at_least(floor) {
            return Ok(());
        }
        Err(DatabaseError::UnsupportedDatabaseVersion {
            database_type: self.dialect.database_type(),
            actual: self.display(&self.version),
            required: self.display(floor),
        })
    }

    /// Fails unless the engine is at least `floor`, naming the edition that
    /// still supports it.
    pub fn ensure_not_older_than_otherwise_recommend_edition_upgrade(
        &self,
        floor: &Version,
        edition: Edition,
    ) -> Result<()> {
        if self.version.is_at_least(floor) {
            return Ok(());
        }
        Err(DatabaseError::EditionUpgradeRequired {
            edition,
            database_type: self.dialect.database_type(),
            actual: self.display(&self.version),
        })
    }

    /// Warns if the engine is strictly newer than `ceiling`. Never fails.
    pub fn recommend_upgrade_if_necessary(&self, ceiling: &Version) -> Option<VersionWarning> {
        self.version
            .is_newer_than(ceiling)
            .then(|| self.warn_untested(ceiling))
    }

    /// Warns if the engine's major version is newer than `ceiling`'s. Never
    /// fails.
    pub fn recommend_upgrade_if_necessary_for_major_version(
        &self,
        ceiling: &Version,
    ) -> Option<VersionWarning> {
        self.version
            .is_major_newer_than(ceiling)
            .then(|| self.warn_untested(ceiling))
    }

    fn warn_untested(&self, ceiling: &Version) -> VersionWarning {
        let warning = VersionWarning {
            database: self.dialect.database_type().to_string(),
            actual: self.display(&self.version),
            newest_tested: self.display(ceiling),
        };
        warn!("{warning}");
        warning
    }

    /// Applies the dialect's whole policy: floor, edition floor, then ceiling.
    ///
    /// # Errors
    ///
    /// Returns the floor violation, if any. Ceiling violations are returned as
    /// a warning instead.
    pub fn ensure_supported(&self) -> Result<Option<VersionWarning>> {
        let policy = self.dialect.version_policy();
        self.ensure_database_is_recent_enough(&policy.floor)?;
        if let Some((floor, edition)) = policy.edition_floor {
            self.ensure_not_older_than_otherwise_recommend_edition_upgrade(&floor, edition)?;
        }
        Ok(match policy.ceiling {
            Some(Ceiling::Full(ceiling)) => self.recommend_upgrade_if_necessary(&ceiling),
            Some(Ceiling::Major(ceiling)) => {
                self.recommend_upgrade_if_necessary_for_major_version(&ceiling)
            }
            None => None,
        })
    }
}
