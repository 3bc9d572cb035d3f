//! Shared data models for modpm operations
//!
//! [`ModId`] is the canonical identity of a MOD and the key of every map in the
//! dependency engine. [`ModSpec`] is the `name[@version|@latest]` form accepted
//! by the CLI and the install/uninstall planners.

use crate::constants::{BASE_MOD, EXPANSION_MODS};
use crate::core::ModpmError;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Canonical MOD identity.
///
/// An opaque, case-sensitive name. Equality and hashing are by name, so two
/// `ModId`s built from the same string are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModId(String);

impl ModId {
    /// Create an identity from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The identity of the base game package.
    #[must_use]
    pub fn base() -> Self {
        Self(BASE_MOD.to_string())
    }

    /// The MOD name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the base game package.
    #[must_use]
    pub fn is_base(&self) -> bool {
        self.0 == BASE_MOD
    }

    /// Whether this is one of the official expansions.
    #[must_use]
    pub fn is_expansion(&self) -> bool {
        EXPANSION_MODS.contains(&self.0.as_str())
    }

    /// Whether this MOD ships with the game instead of the mods directory.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.is_base() || self.is_expansion()
    }
}

impl fmt::Display for ModId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ModId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ModId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which release of a MOD a [`ModSpec`] asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionSelector {
    /// The release with the latest publish timestamp (`name` or `name@latest`).
    #[default]
    Latest,
    /// Exactly this version (`name@1.2.3`).
    Exact(Version),
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Exact(version) => write!(f, "{version}"),
        }
    }
}

/// A `name`, `name@version` or `name@latest` request from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModSpec {
    /// Requested MOD
    pub id: ModId,
    /// Requested release
    pub version: VersionSelector,
}

impl ModSpec {
    /// Request the latest release of `name`.
    pub fn latest(name: impl Into<String>) -> Self {
        Self {
            id: ModId::new(name),
            version: VersionSelector::Latest,
        }
    }

    /// Request an exact version of `name`.
    pub fn exact(name: impl Into<String>, version: Version) -> Self {
        Self {
            id: ModId::new(name),
            version: VersionSelector::Exact(version),
        }
    }

    /// The exact version, if one was requested.
    #[must_use]
    pub const fn exact_version(&self) -> Option<Version> {
        match self.version {
            VersionSelector::Latest => None,
            VersionSelector::Exact(version) => Some(version),
        }
    }
}

impl FromStr for ModSpec {
    type Err = ModpmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ModpmError::InvalidModSpec {
            spec: s.to_string(),
            reason: reason.to_string(),
        };

        let (name, version) = match s.rsplit_once('@') {
            Some((name, version)) => (name.trim(), Some(version.trim())),
            None => (s.trim(), None),
        };

        if name.is_empty() {
            return Err(invalid("MOD name is empty"));
        }

        let version = match version {
            None | Some("latest") => VersionSelector::Latest,
            Some("") => return Err(invalid("version after '@' is empty")),
            Some(version) => VersionSelector::Exact(version.parse()?),
        };

        Ok(Self {
            id: ModId::new(name),
            version,
        })
    }
}

impl fmt::Display for ModSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            VersionSelector::Latest => write!(f, "{}", self.id),
            VersionSelector::Exact(version) => write!(f, "{}@{version}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinguished_identities() {
        assert!(ModId::base().is_base());
        assert!(ModId::new("space-age").is_expansion());
        assert!(ModId::new("quality").is_builtin());
        assert!(!ModId::new("Base").is_base());
        assert!(!ModId::new("helmod").is_builtin());
    }

    #[test]
    fn test_parse_mod_specs() {
        let spec: ModSpec = "helmod".parse().unwrap();
        assert_eq!(spec, ModSpec::latest("helmod"));

        let spec: ModSpec = "helmod@latest".parse().unwrap();
        assert_eq!(spec.version, VersionSelector::Latest);

        let spec: ModSpec = "helmod@2.1.4".parse().unwrap();
        assert_eq!(spec.exact_version(), Some(Version::new(2, 1, 4)));
        assert_eq!(spec.to_string(), "helmod@2.1.4");
    }

    #[test]
    fn test_parse_mod_spec_errors() {
        assert!("@1.0.0".parse::<ModSpec>().is_err());
        assert!("helmod@".parse::<ModSpec>().is_err());
        assert!("helmod@one".parse::<ModSpec>().is_err());
    }
}
