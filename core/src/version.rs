//! Engine versions and product editions.
//!
//! A [`Version`] is the `(major, minor)` pair an engine reports about itself.
//! Ordering is lexicographic on the pair, which is what version floors and
//! ceilings compare against.
//!
//! # Examples
//!
//! ```
//! use schema_history_core::Version;
//!
//! let actual: Version = "9.1".parse().unwrap();
//! assert!(actual.is_at_least(&Version::new(9, 0)));
//! assert!(!actual.is_newer_than(&"9.1".parse().unwrap()));
//! assert!(!actual.is_major_newer_than(&"9.9".parse().unwrap()));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A `major.minor` engine version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    major: u32,
    minor: u32,
}

impl Version {
    /// Creates a version from its components.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Creates a version from the integers an engine reports in its metadata.
    ///
    /// Equivalent to parsing `"{major}.{minor}"`.
    pub fn from_metadata(major: u32, minor: u32) -> Self {
        Self::new(major, minor)
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Returns `true` if `self >= other` on `(major, minor)`.
    pub fn is_at_least(&self, other: &Version) -> bool {
        self >= other
    }

    /// Returns `true` if `self > other` on `(major, minor)`.
    pub fn is_newer_than(&self, other: &Version) -> bool {
        self > other
    }

    /// Returns `true` if the major component alone is greater.
    pub fn is_major_newer_than(&self, other: &Version) -> bool {
        self.major > other.major
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidVersion(s.to_string());
        let mut parts = s.trim().split('.');

        let major = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        let minor = match parts.next() {
            Some(p) => p.parse::<u32>().map_err(|_| invalid())?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self { major, minor })
    }
}

impl TryFrom<String> for Version {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

/// Product edition of the migration tool.
///
/// Older engine versions may remain supported by a higher edition after the
/// community edition drops them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edition {
    Community,
    Pro,
    Enterprise,
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Edition::Community => "Community Edition",
            Edition::Pro => "Pro Edition",
            Edition::Enterprise => "Enterprise Edition",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_major_minor() {
        assert_eq!(v("9.4"), Version::new(9, 4));
        assert_eq!(v(" 12.2 "), Version::new(12, 2));
    }

    #[test]
    fn test_parse_major_only_defaults_minor_to_zero() {
        assert_eq!(v("11"), Version::new(11, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Version>().is_err());
        assert!("abc".parse::<Version>().is_err());
        assert!("9.x".parse::<Version>().is_err());
        assert!("1.2.3".parse::<Version>().is_err());
        assert!("-1.0".parse::<Version>().is_err());
    }

    #[test]
    fn test_from_metadata_matches_concatenated_string() {
        assert_eq!(Version::from_metadata(8, 9), v("8.9"));
        assert_eq!(Version::from_metadata(8, 9).to_string(), "8.9");
    }

    #[test]
    fn test_is_at_least_is_lexicographic() {
        let floor = v("9.0");
        assert!(!v("8.9").is_at_least(&floor));
        assert!(v("9.0").is_at_least(&floor));
        assert!(v("9.1").is_at_least(&floor));
        assert!(v("10.0").is_at_least(&v("9.10")));
    }

    #[test]
    fn test_is_newer_than_is_strict() {
        assert!(!v("11.0").is_newer_than(&v("11.0")));
        assert!(v("11.1").is_newer_than(&v("11.0")));
        assert!(!v("10.9").is_newer_than(&v("11.0")));
    }

    #[test]
    fn test_major_comparison_ignores_minor() {
        assert!(!v("10.9").is_major_newer_than(&v("10.0")));
        assert!(v("11.3").is_major_newer_than(&v("10.0")));
        assert!(!v("10.0").is_major_newer_than(&v("10.5")));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("5.7")).unwrap();
        assert_eq!(json, "\"5.7\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("5.7"));
        assert!(serde_json::from_str::<Version>("\"x\"").is_err());
    }

    #[test]
    fn test_edition_display() {
        assert_eq!(Edition::Enterprise.to_string(), "Enterprise Edition");
    }
}
