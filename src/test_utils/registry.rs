//! In-memory registry and downloader for planner and executor tests.

use super::fixtures::write_mod_archive;
use crate::installer::Downloader;
use crate::registry::{RegistryClient, RegistryError, RegistryMod, Release, ReleaseInfo};
use crate::version::Version;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// A [`RegistryClient`] backed by a map.
///
/// Each added release is published one day after the previous one, so the
/// last release added for a MOD is its "latest" unless a timestamp is given.
#[derive(Debug, Default)]
pub struct MockRegistry {
    mods: HashMap<String, RegistryMod>,
    failures: HashMap<String, RegistryError>,
    delays: HashMap<String, Duration>,
    published: i64,
    fetches: Mutex<Vec<String>>,
}

impl MockRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a release that declares no game version.
    pub fn with_release(self, name: &str, version: &str, deps: &[&str]) -> Self {
        self.with_game_release(name, version, None, deps)
    }

    /// Publish a release built for `game_version` (`"2.0"`), or for any game.
    pub fn with_game_release(
        mut self,
        name: &str,
        version: &str,
        game_version: Option<&str>,
        deps: &[&str],
    ) -> Self {
        self.published += 1;
        let released_at = DateTime::<Utc>::from_timestamp(1_700_000_000 + self.published * 86_400, 0)
            .expect("valid fixture timestamp");
        self.with_release_at(name, version, game_version, released_at, deps)
    }

    /// Publish a release with an explicit timestamp.
    pub fn with_release_at(
        mut self,
        name: &str,
        version: &str,
        game_version: Option<&str>,
        released_at: DateTime<Utc>,
        deps: &[&str],
    ) -> Self {
        let version: Version = version.parse().expect("valid fixture version");
        let release = Release {
            version,
            file_name: format!("{name}_{version}.zip"),
            download_url: format!("/download/{name}/{version}"),
            released_at,
            sha1: None,
            info_json: ReleaseInfo {
                game_version: game_version.map(|v| v.parse().expect("valid fixture game version")),
                dependencies: deps.iter().map(|d| (*d).to_string()).collect(),
            },
        };
        self.mods
            .entry(name.to_string())
            .or_insert_with(|| RegistryMod {
                name: name.to_string(),
                title: name.to_string(),
                owner: "fixture".to_string(),
                releases: Vec::new(),
            })
            .releases
            .push(release);
        self
    }

    /// Make every fetch of `name` fail with `error`.
    pub fn with_failure(mut self, name: &str, error: RegistryError) -> Self {
        self.failures.insert(name.to_string(), error);
        self
    }

    /// Delay every fetch of `name`.
    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    /// How often `name` was fetched.
    pub fn fetch_count(&self, name: &str) -> usize {
        self.fetches.lock().expect("fetch log").iter().filter(|n| *n == name).count()
    }

    /// Every fetched name in request order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetches.lock().expect("fetch log").clone()
    }
}

impl RegistryClient for MockRegistry {
    async fn fetch_mod(&self, name: &str) -> Result<RegistryMod, RegistryError> {
        self.fetches.lock().expect("fetch log").push(name.to_string());

        if let Some(delay) = self.delays.get(name) {
            tokio::time::sleep(*delay).await;
        }

        if let Some(error) = self.failures.get(name) {
            return Err(error.clone());
        }

        self.mods.get(name).cloned().ok_or_else(|| RegistryError::NotFound {
            name: name.to_string(),
        })
    }
}

/// A [`Downloader`] that writes a fixture archive instead of downloading.
///
/// The archive's manifest carries the release's dependencies, so a later
/// [`InstalledMods::scan`](crate::installed::InstalledMods::scan) sees the MOD.
#[derive(Debug, Default)]
pub struct MockDownloader {
    failing: HashSet<String>,
    downloads: Mutex<Vec<String>>,
}

impl MockDownloader {
    /// Create a downloader that succeeds for every release.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make downloads of `name` fail.
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Archive file names written so far.
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().expect("download log").clone()
    }
}

impl Downloader for MockDownloader {
    async fn download(&self, release: &Release, dest_dir: &Path) -> anyhow::Result<PathBuf> {
        let stem = release.file_name.trim_end_matches(".zip");
        let name = stem.rsplit_once('_').map_or(stem, |(name, _)| name);
        if self.failing.contains(name) {
            anyhow::bail!("simulated download failure for '{name}'");
        }

        let deps: Vec<&str> = release.info_json.dependencies.iter().map(String::as_str).collect();
        let path = write_mod_archive(dest_dir, name, &release.version.to_string(), &deps);
        self.downloads.lock().expect("download log").push(release.file_name.clone());
        Ok(path)
    }
}
