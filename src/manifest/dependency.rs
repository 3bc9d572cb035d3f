//! Parsing of manifest dependency strings.
//!
//! Each entry of a manifest's `dependencies` array has the form
//!
//! ```text
//! [prefix] <name> [<comparator> <version>]
//! ```
//!
//! where the optional prefix selects the [`DependencyKind`]:
//!
//! | Prefix | Kind |
//! |--------|------|
//! | (none) | [`DependencyKind::Required`] |
//! | `?`    | [`DependencyKind::Optional`] |
//! | `(?)`  | [`DependencyKind::HiddenOptional`] |
//! | `!`    | [`DependencyKind::Incompatible`] |
//! | `~`    | [`DependencyKind::LoadNeutral`] |
//!
//! MOD names may contain spaces; surrounding whitespace is ignored.

use crate::core::ModpmError;
use crate::models::ModId;
use crate::version::{Comparator, VersionRequirement};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static DEPENDENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(?P<prefix>!|\(\?\)|\?|~)\s*)?(?P<name>[^<>=]+?)\s*(?:(?P<cmp><=|>=|<|>|=)\s*(?P<version>\S+))?\s*$",
    )
    .expect("dependency pattern is valid")
});

/// The five dependency declaration kinds.
///
/// Only [`Required`](Self::Required) and [`Incompatible`](Self::Incompatible)
/// affect planning and validation; the others are informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// Must be installed and enabled
    Required,
    /// Loaded first when present
    Optional,
    /// Optional, not shown in the game's UI
    HiddenOptional,
    /// Must not be enabled at the same time
    Incompatible,
    /// Declared without affecting load order
    LoadNeutral,
}

impl DependencyKind {
    /// The manifest prefix for this kind.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Required => "",
            Self::Optional => "? ",
            Self::HiddenOptional => "(?) ",
            Self::Incompatible => "! ",
            Self::LoadNeutral => "~ ",
        }
    }

    /// Whether edges of this kind take part in planning and validation.
    #[must_use]
    pub const fn is_relevant(&self) -> bool {
        match self {
            Self::Required | Self::Incompatible => true,
            Self::Optional | Self::HiddenOptional | Self::LoadNeutral => false,
        }
    }

    fn from_prefix(prefix: Option<&str>) -> Self {
        match prefix {
            Some("!") => Self::Incompatible,
            Some("(?)") => Self::HiddenOptional,
            Some("?") => Self::Optional,
            Some("~") => Self::LoadNeutral,
            _ => Self::Required,
        }
    }
}

/// One typed entry of a manifest's dependency list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DependencyEntry {
    /// The MOD this entry points at
    pub target: ModId,
    /// How the target relates to the declaring MOD
    pub kind: DependencyKind,
    /// Version constraint on the target
    pub requirement: VersionRequirement,
}

impl DependencyEntry {
    /// A required entry without version constraint.
    #[must_use]
    pub fn required(target: ModId) -> Self {
        Self {
            target,
            kind: DependencyKind::Required,
            requirement: VersionRequirement::Any,
        }
    }
}

impl FromStr for DependencyEntry {
    type Err = ModpmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ModpmError::InvalidDependency {
            entry: s.to_string(),
            reason: reason.to_string(),
        };

        let caps = DEPENDENCY_RE
            .captures(s)
            .ok_or_else(|| invalid("expected '[prefix] <name> [<comparator> <version>]'"))?;

        let name = caps.name("name").map_or("", |m| m.as_str().trim());
        if name.is_empty() || name.starts_with(['!', '?', '~', '(']) {
            return Err(invalid("MOD name is missing or malformed"));
        }

        let requirement = match (caps.name("cmp"), caps.name("version")) {
            (Some(cmp), Some(version)) => {
                let comparator = Comparator::from_token(cmp.as_str())
                    .ok_or_else(|| invalid("unknown comparator"))?;
                VersionRequirement::new(comparator, version.as_str().parse()?)
            }
            _ => VersionRequirement::Any,
        };

        Ok(Self {
            target: ModId::new(name),
            kind: DependencyKind::from_prefix(caps.name("prefix").map(|m| m.as_str())),
            requirement,
        })
    }
}

impl TryFrom<String> for DependencyEntry {
    type Error = ModpmError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DependencyEntry> for String {
    fn from(value: DependencyEntry) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DependencyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.target)?;
        if !self.requirement.is_any() {
            write!(f, " {}", self.requirement)?;
        }
        Ok(())
    }
}

/// Parse a whole dependency list, failing on the first malformed entry.
pub fn parse_dependencies<S: AsRef<str>>(raw: &[S]) -> Result<Vec<DependencyEntry>, ModpmError> {
    raw.iter().map(|entry| entry.as_ref().parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    fn entry(s: &str) -> DependencyEntry {
        s.parse().unwrap()
    }

    #[test]
    fn test_prefixes_select_kind() {
        assert_eq!(entry("base").kind, DependencyKind::Required);
        assert_eq!(entry("? helmod").kind, DependencyKind::Optional);
        assert_eq!(entry("(?) helmod").kind, DependencyKind::HiddenOptional);
        assert_eq!(entry("! helmod").kind, DependencyKind::Incompatible);
        assert_eq!(entry("~ helmod").kind, DependencyKind::LoadNeutral);
        assert_eq!(entry("?helmod").kind, DependencyKind::Optional);
    }

    #[test]
    fn test_requirement_is_parsed() {
        let dep = entry("base >= 2.0");
        assert_eq!(dep.target, ModId::base());
        assert_eq!(dep.requirement, VersionRequirement::new(Comparator::Ge, Version::new(2, 0, 0)));

        let dep = entry("! bobs-mod<1.1.0");
        assert_eq!(dep.kind, DependencyKind::Incompatible);
        assert_eq!(dep.target.as_str(), "bobs-mod");
        assert_eq!(dep.requirement, VersionRequirement::new(Comparator::Lt, Version::new(1, 1, 0)));
    }

    #[test]
    fn test_names_with_spaces() {
        let dep = entry("(?) Krastorio 2 = 1.3.0");
        assert_eq!(dep.target.as_str(), "Krastorio 2");
        assert_eq!(dep.kind, DependencyKind::HiddenOptional);
        assert_eq!(dep.requirement, VersionRequirement::exact(Version::new(1, 3, 0)));
    }

    #[test]
    fn test_malformed_entries_are_rejected() {
        assert!("".parse::<DependencyEntry>().is_err());
        assert!("!".parse::<DependencyEntry>().is_err());
        assert!("mod >= ".parse::<DependencyEntry>().is_err());
        assert!("mod >= abc".parse::<DependencyEntry>().is_err());
    }

    #[test]
    fn test_only_required_and_incompatible_are_relevant() {
        assert!(DependencyKind::Required.is_relevant());
        assert!(DependencyKind::Incompatible.is_relevant());
        assert!(!DependencyKind::Optional.is_relevant());
        assert!(!DependencyKind::HiddenOptional.is_relevant());
        assert!(!DependencyKind::LoadNeutral.is_relevant());
    }

    #[test]
    fn test_display_matches_manifest_form() {
        assert_eq!(entry("?   helmod >=1.0").to_string(), "? helmod >= 1.0.0");
        assert_eq!(entry("base").to_string(), "base");
    }

    #[test]
    fn test_parse_dependencies_list() {
        let deps = parse_dependencies(&["base >= 2.0", "! other"]).unwrap();
        assert_eq!(deps.len(), 2);
        assert!(parse_dependencies(&["base", ""]).is_err());
    }
}
