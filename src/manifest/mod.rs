//! MOD manifest (`info.json`) model.
//!
//! Every MOD archive or directory carries an `info.json` describing the MOD's
//! identity and its dependency declarations:
//!
//! ```json
//! {
//!   "name": "helmod",
//!   "version": "2.1.4",
//!   "title": "Helmod",
//!   "author": "Helfima",
//!   "factorio_version": "2.0",
//!   "dependencies": ["base >= 2.0", "? space-age", "! old-helper"]
//! }
//! ```
//!
//! A manifest without a `dependencies` key depends on `base` only. Reading
//! manifests from archives and directories lives in [`io`].

pub mod dependency;
pub mod io;

pub use dependency::{DependencyEntry, DependencyKind, parse_dependencies};

use crate::core::ModpmError;
use crate::models::ModId;
use crate::version::Version;
use serde::{Deserialize, Serialize};

/// Parsed contents of a MOD's `info.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModManifest {
    /// MOD identity
    pub name: ModId,
    /// Version of this artifact
    pub version: Version,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Author
    #[serde(default)]
    pub author: String,
    /// Game version the MOD targets (`major.minor`)
    #[serde(default, rename = "factorio_version", skip_serializing_if = "Option::is_none")]
    pub game_version: Option<Version>,
    /// Typed dependency declarations
    #[serde(default = "default_dependencies")]
    pub dependencies: Vec<DependencyEntry>,
}

fn default_dependencies() -> Vec<DependencyEntry> {
    vec![DependencyEntry::required(ModId::base())]
}

impl ModManifest {
    /// Build a manifest for `name`/`version` from raw dependency strings.
    pub fn new<S: AsRef<str>>(
        name: impl Into<ModId>,
        version: Version,
        dependencies: &[S],
    ) -> Result<Self, ModpmError> {
        Ok(Self {
            name: name.into(),
            version,
            title: String::new(),
            author: String::new(),
            game_version: None,
            dependencies: parse_dependencies(dependencies)?,
        })
    }

    /// Parse manifest JSON; `origin` names the source in error messages.
    pub fn from_json(content: &str, origin: &str) -> Result<Self, ModpmError> {
        serde_json::from_str(content).map_err(|e| ModpmError::ManifestParseError {
            path: origin.to_string(),
            reason: e.to_string(),
        })
    }

    /// Dependency entries of the given kind.
    pub fn dependencies_of(&self, kind: DependencyKind) -> impl Iterator<Item = &DependencyEntry> {
        self.dependencies.iter().filter(move |dep| dep.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_manifest() {
        let manifest = ModManifest::from_json(
            r#"{
                "name": "helmod",
                "version": "2.1.4",
                "title": "Helmod",
                "author": "Helfima",
                "factorio_version": "2.0",
                "dependencies": ["base >= 2.0", "? space-age", "! old-helper"],
                "homepage": "ignored"
            }"#,
            "helmod_2.1.4.zip",
        )
        .unwrap();

        assert_eq!(manifest.name.as_str(), "helmod");
        assert_eq!(manifest.version, Version::new(2, 1, 4));
        assert_eq!(manifest.game_version, Some(Version::new(2, 0, 0)));
        assert_eq!(manifest.dependencies.len(), 3);
        assert_eq!(manifest.dependencies_of(DependencyKind::Incompatible).count(), 1);
    }

    #[test]
    fn test_missing_dependencies_default_to_base() {
        let manifest =
            ModManifest::from_json(r#"{"name": "tiny", "version": "0.1.0"}"#, "tiny").unwrap();
        assert_eq!(manifest.dependencies, vec![DependencyEntry::required(ModId::base())]);
    }

    #[test]
    fn test_malformed_manifest_names_origin() {
        let err = ModManifest::from_json(
            r#"{"name": "bad", "version": "1.0.0", "dependencies": ["! "]}"#,
            "bad_1.0.0.zip",
        )
        .unwrap_err();
        assert!(err.to_string().contains("bad_1.0.0.zip"));
    }
}
