//! Version values and version requirements for MOD dependencies.
//!
//! MOD versions are plain `major.minor.patch` triples without prerelease or
//! build metadata. Manifests may write game versions with two components
//! (`"2.0"`), so parsing accepts one to three components and fills the missing
//! ones with zero.
//!
//! A [`VersionRequirement`] pairs an optional [`Comparator`] with a version and
//! answers a single question: does a given version satisfy it? Requirements are
//! never intersected; every dependency edge is checked on its own against the
//! one resolved version of its target.
//!
//! # Examples
//!
//! ```rust
//! use modpm::version::{Version, VersionRequirement};
//!
//! let installed: Version = "1.4.2".parse().unwrap();
//! let req: VersionRequirement = ">= 1.2.0".parse().unwrap();
//! assert!(req.satisfied_by(&installed));
//! assert!(VersionRequirement::Any.satisfied_by(&installed));
//! ```

use crate::core::ModpmError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A MOD version, totally ordered by `(major, minor, patch)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    /// Major component
    pub major: u32,
    /// Minor component
    pub minor: u32,
    /// Patch component
    pub patch: u32,
}

impl Version {
    /// Create a version from its three components.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Whether `self` and `other` share the same `major.minor` pair.
    ///
    /// Game versions are compared this way: a release built for `2.0` runs on
    /// every `2.0.x` game build.
    #[must_use]
    pub const fn same_minor_series(&self, other: &Self) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

impl FromStr for Version {
    type Err = ModpmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = |reason: &str| ModpmError::InvalidVersion {
            version: s.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid("version is empty"));
        }

        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.len() > 3 {
            return Err(invalid("expected at most three dot-separated components"));
        }

        let mut components = [0u32; 3];
        for (slot, part) in components.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("components must be non-negative integers"));
            }
            *slot = part.parse().map_err(|_| invalid("component is out of range"))?;
        }

        Ok(Self::new(components[0], components[1], components[2]))
    }
}

impl TryFrom<String> for Version {
    type Error = ModpmError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Comparison operator of a version requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// `=`
    Eq,
    /// `>=`
    Ge,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `<`
    Lt,
}

impl Comparator {
    /// Parse a comparator token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "=" => Some(Self::Eq),
            ">=" => Some(Self::Ge),
            ">" => Some(Self::Gt),
            "<=" => Some(Self::Le),
            "<" => Some(Self::Lt),
            _ => None,
        }
    }

    /// The textual token for this comparator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Lt => "<",
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ge => ordering != Ordering::Less,
            Self::Gt => ordering == Ordering::Greater,
            Self::Le => ordering != Ordering::Greater,
            Self::Lt => ordering == Ordering::Less,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requirement on the version of a dependency target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VersionRequirement {
    /// No constraint; every version satisfies it.
    #[default]
    Any,
    /// `comparator version`, e.g. `>= 1.2.0`.
    Constraint {
        /// How candidate versions are compared against `version`
        comparator: Comparator,
        /// The version on the right-hand side of the comparison
        version: Version,
    },
}

impl VersionRequirement {
    /// Build a constrained requirement.
    #[must_use]
    pub const fn new(comparator: Comparator, version: Version) -> Self {
        Self::Constraint {
            comparator,
            version,
        }
    }

    /// Build an exact (`=`) requirement.
    #[must_use]
    pub const fn exact(version: Version) -> Self {
        Self::new(Comparator::Eq, version)
    }

    /// Whether `version` satisfies this requirement.
    #[must_use]
    pub fn satisfied_by(&self, version: &Version) -> bool {
        match self {
            Self::Any => true,
            Self::Constraint {
                comparator,
                version: bound,
            } => comparator.accepts(version.cmp(bound)),
        }
    }

    /// Whether this requirement places no constraint.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl FromStr for VersionRequirement {
    type Err = ModpmError;

    /// Parse `"<cmp> <version>"`; whitespace between the two is optional.
    /// An empty string parses to [`VersionRequirement::Any`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::Any);
        }

        let split = trimmed.find(|c: char| !matches!(c, '<' | '>' | '=')).unwrap_or(trimmed.len());
        let (token, rest) = trimmed.split_at(split);
        let comparator = Comparator::from_token(token).ok_or_else(|| ModpmError::InvalidVersion {
            version: s.to_string(),
            reason: format!("unknown comparator '{token}'"),
        })?;

        Ok(Self::new(comparator, rest.trim().parse()?))
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any version"),
            Self::Constraint {
                comparator,
                version,
            } => write!(f, "{comparator} {version}"),
        }
    }
}
