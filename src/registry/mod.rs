//! Remote MOD registry access.
//!
//! The registry publishes, per MOD, every release with its download location,
//! publish timestamp and the dependency list of that release's manifest. Install
//! planning only ever asks one question of it: "give me everything about MOD
//! `name`" ([`RegistryClient::fetch_mod`]); release selection happens locally
//! on the returned [`RegistryMod`].
//!
//! # Release selection
//!
//! "Latest" means the release with the most recent `released_at`, not the
//! highest version number. When the game version is known, only releases built
//! for the same `major.minor` game series are candidates for latest-style
//! lookups; an exact version request is honored regardless of game version.

pub mod http;

pub use http::HttpRegistry;

use crate::core::ModpmError;
use crate::manifest::{ModManifest, parse_dependencies};
use crate::models::ModId;
use crate::version::{Version, VersionRequirement};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

/// Failure to obtain MOD metadata from the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The registry does not know the MOD
    #[error("MOD '{name}' was not found in the registry")]
    NotFound {
        /// Requested MOD name
        name: String,
    },

    /// Transport failure or unexpected HTTP status
    #[error("registry request for '{name}' failed: {message}")]
    Http {
        /// Requested MOD name
        name: String,
        /// Underlying failure
        message: String,
        /// Whether retrying may succeed
        transient: bool,
    },

    /// The response body could not be decoded
    #[error("registry returned malformed metadata for '{name}': {message}")]
    Decode {
        /// Requested MOD name
        name: String,
        /// Decoder message
        message: String,
    },
}

impl RegistryError {
    /// Whether retrying the request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Http { transient: true, .. })
    }
}

/// Source of MOD metadata for install planning.
///
/// Implementations must be shareable across the concurrent fetches of one
/// planning round.
pub trait RegistryClient: Send + Sync {
    /// Fetch all published releases of `name`.
    fn fetch_mod(&self, name: &str) -> impl Future<Output = Result<RegistryMod, RegistryError>> + Send;
}

/// Everything the registry knows about one MOD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMod {
    /// MOD name
    pub name: String,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Owner account
    #[serde(default)]
    pub owner: String,
    /// Published releases, in registry order
    #[serde(default)]
    pub releases: Vec<Release>,
}

/// One published release of a MOD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Release version
    pub version: Version,
    /// Archive name to store the download under
    pub file_name: String,
    /// Download path relative to the registry root
    pub download_url: String,
    /// Publish timestamp
    pub released_at: DateTime<Utc>,
    /// SHA-1 of the archive, when published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    /// Manifest excerpt of the release
    #[serde(default)]
    pub info_json: ReleaseInfo,
}

/// The manifest fields the registry exposes per release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// Game version the release targets
    #[serde(default, rename = "factorio_version", skip_serializing_if = "Option::is_none")]
    pub game_version: Option<Version>,
    /// Raw dependency strings
    #[serde(default = "default_release_dependencies")]
    pub dependencies: Vec<String>,
}

impl Default for ReleaseInfo {
    fn default() -> Self {
        Self {
            game_version: None,
            dependencies: default_release_dependencies(),
        }
    }
}

fn default_release_dependencies() -> Vec<String> {
    vec![crate::constants::BASE_MOD.to_string()]
}

impl Release {
    /// Build the manifest of this release for MOD `name`.
    pub fn manifest(&self, name: &ModId) -> Result<ModManifest, ModpmError> {
        Ok(ModManifest {
            name: name.clone(),
            version: self.version,
            title: String::new(),
            author: String::new(),
            game_version: self.info_json.game_version,
            dependencies: parse_dependencies(&self.info_json.dependencies)?,
        })
    }

    /// Whether this release runs on `game_version`.
    ///
    /// Releases that do not declare a game version are accepted.
    #[must_use]
    pub fn is_compatible_with(&self, game_version: Option<&Version>) -> bool {
        match (game_version, self.info_json.game_version.as_ref()) {
            (Some(game), Some(target)) => target.same_minor_series(game),
            _ => true,
        }
    }
}

impl RegistryMod {
    /// The most recently published release compatible with `game_version`.
    #[must_use]
    pub fn latest_release(&self, game_version: Option<&Version>) -> Option<&Release> {
        self.latest_satisfying(&VersionRequirement::Any, game_version)
    }

    /// The most recently published compatible release satisfying `requirement`.
    #[must_use]
    pub fn latest_satisfying(
        &self,
        requirement: &VersionRequirement,
        game_version: Option<&Version>,
    ) -> Option<&Release> {
        self.releases
            .iter()
            .filter(|release| release.is_compatible_with(game_version))
            .filter(|release| requirement.satisfied_by(&release.version))
            .max_by_key(|release| (release.released_at, release.version))
    }

    /// The release with exactly `version`.
    #[must_use]
    pub fn release(&self, version: &Version) -> Option<&Release> {
        self.releases.iter().find(|release| release.version == *version)
    }
}
