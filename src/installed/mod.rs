//! Enumeration of MOD artifacts present on disk.
//!
//! [`InstalledMods`] is the read-only view of what is physically installed: every
//! archive (`name_version.zip`) or extracted directory in the mods directory, plus
//! the base game and expansions shipped in the game's data directory. One MOD may
//! be present at several versions at once; each artifact is a separate
//! [`InstalledMod`].
//!
//! The dependency engine never touches these files. Only plan execution
//! ([`crate::installer`]) adds or deletes artifacts.

use crate::constants::MANIFEST_FILE;
use crate::manifest::{ModManifest, io};
use crate::models::ModId;
use crate::version::Version;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// How a MOD artifact is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageForm {
    /// A zip archive
    Archive,
    /// An extracted directory
    Directory,
}

/// One concrete MOD artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledMod {
    /// MOD identity
    pub id: ModId,
    /// Version of this artifact
    pub version: Version,
    /// Archive or directory
    pub form: StorageForm,
    /// Location of the archive or directory
    pub path: PathBuf,
    /// Parsed manifest
    pub manifest: ModManifest,
}

impl InstalledMod {
    /// Build an artifact record from a manifest.
    pub fn new(manifest: ModManifest, form: StorageForm, path: impl Into<PathBuf>) -> Self {
        Self {
            id: manifest.name.clone(),
            version: manifest.version,
            form,
            path: path.into(),
            manifest,
        }
    }

    /// Read the artifact at `path`, deciding its form from the file type.
    pub fn read(path: &Path) -> Result<Self> {
        if path.is_dir() {
            Ok(Self::new(io::read_from_dir(path)?, StorageForm::Directory, path))
        } else {
            Ok(Self::new(io::read_from_archive(path)?, StorageForm::Archive, path))
        }
    }
}

/// All installed artifacts, grouped by identity and ordered by version.
#[derive(Debug, Clone, Default)]
pub struct InstalledMods {
    mods: BTreeMap<ModId, Vec<InstalledMod>>,
}

impl InstalledMods {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from artifact records.
    pub fn from_mods(mods: impl IntoIterator<Item = InstalledMod>) -> Self {
        let mut set = Self::new();
        for installed in mods {
            set.insert(installed);
        }
        set
    }

    /// Scan the mods directory and, when given, the game data directory.
    ///
    /// Unreadable or malformed artifacts are skipped with a warning so that one
    /// broken archive does not block every command. A missing mods directory
    /// yields an empty set.
    pub fn scan(mods_dir: &Path, data_dir: Option<&Path>) -> Result<Self> {
        let mut set = Self::new();

        if let Some(data_dir) = data_dir {
            for entry in Self::candidates(data_dir)? {
                // The data directory also holds `core`, which is not a MOD
                let is_builtin = entry
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| ModId::new(name).is_builtin());
                if is_builtin && entry.join(MANIFEST_FILE).is_file() {
                    set.read_into(&entry);
                }
            }
        }

        if mods_dir.is_dir() {
            for entry in Self::candidates(mods_dir)? {
                let is_archive = entry.extension().is_some_and(|ext| ext == "zip");
                if is_archive || entry.join(MANIFEST_FILE).is_file() {
                    set.read_into(&entry);
                }
            }
        }

        debug!("Found {} installed MODs ({} artifacts)", set.mods.len(), set.artifact_count());
        Ok(set)
    }

    fn candidates(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
            paths.push(entry.into_path());
        }
        Ok(paths)
    }

    fn read_into(&mut self, path: &Path) {
        match InstalledMod::read(path) {
            Ok(installed) => self.insert(installed),
            Err(e) => warn!("Skipping unreadable MOD at {}: {e:#}", path.display()),
        }
    }

    /// Add an artifact, keeping each identity's versions sorted ascending.
    pub fn insert(&mut self, installed: InstalledMod) {
        let versions = self.mods.entry(installed.id.clone()).or_default();
        let pos = versions.partition_point(|existing| existing.version <= installed.version);
        versions.insert(pos, installed);
    }

    /// Whether any version of `id` is installed.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.mods.contains_key(id)
    }

    /// Whether `id` is installed at exactly `version`.
    #[must_use]
    pub fn contains_version(&self, id: &str, version: &Version) -> bool {
        self.versions_of(id).iter().any(|installed| installed.version == *version)
    }

    /// Every artifact of `id`, ascending by version.
    #[must_use]
    pub fn versions_of(&self, id: &str) -> &[InstalledMod] {
        self.mods.get(id).map_or(&[], Vec::as_slice)
    }

    /// The artifact of `id` at `version`.
    #[must_use]
    pub fn get(&self, id: &str, version: &Version) -> Option<&InstalledMod> {
        self.versions_of(id).iter().find(|installed| installed.version == *version)
    }

    /// The highest installed version of `id`.
    #[must_use]
    pub fn latest(&self, id: &str) -> Option<&InstalledMod> {
        self.versions_of(id).last()
    }

    /// Installed identities in name order.
    pub fn ids(&self) -> impl Iterator<Item = &ModId> {
        self.mods.keys()
    }

    /// Every artifact, grouped by identity in name order.
    pub fn iter(&self) -> impl Iterator<Item = &InstalledMod> {
        self.mods.values().flatten()
    }

    /// Number of distinct installed identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mods.len()
    }

    /// Whether nothing is installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    fn artifact_count(&self) -> usize {
        self.mods.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_dir_mod(root: &Path, folder: &str, name: &str, version: &str) {
        let dir = root.join(folder);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("info.json"),
            format!(r#"{{"name": "{name}", "version": "{version}"}}"#),
        )
        .unwrap();
    }

    #[test]
    fn test_scan_groups_versions() {
        let temp = TempDir::new().unwrap();
        let mods_dir = temp.path().join("mods");
        write_dir_mod(&mods_dir, "x_2.0.0", "x", "2.0.0");
        write_dir_mod(&mods_dir, "x_1.0.0", "x", "1.0.0");
        write_dir_mod(&mods_dir, "y", "y", "0.3.0");
        fs::write(mods_dir.join("mod-list.json"), "{}").unwrap();
        fs::write(mods_dir.join("broken_1.0.0.zip"), "not a zip").unwrap();

        let installed = InstalledMods::scan(&mods_dir, None).unwrap();
        assert_eq!(installed.len(), 2);
        let versions: Vec<_> = installed.versions_of("x").iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![Version::new(1, 0, 0), Version::new(2, 0, 0)]);
        assert_eq!(installed.latest("x").unwrap().version, Version::new(2, 0, 0));
        assert_eq!(installed.versions_of("x")[0].form, StorageForm::Directory);
        assert!(!installed.contains("broken"));
    }

    #[test]
    fn test_scan_includes_builtin_data_only() {
        let temp = TempDir::new().unwrap();
        let data_dir = temp.path().join("data");
        write_dir_mod(&data_dir, "base", "base", "2.0.28");
        write_dir_mod(&data_dir, "space-age", "space-age", "2.0.28");
        write_dir_mod(&data_dir, "core", "core", "2.0.28");

        let installed = InstalledMods::scan(&temp.path().join("missing"), Some(&data_dir)).unwrap();
        assert!(installed.contains("base"));
        assert!(installed.contains("space-age"));
        assert!(!installed.contains("core"));
    }

    #[test]
    fn test_contains_version_and_get() {
        let manifest = ModManifest::new("z", Version::new(1, 0, 0), &["base"]).unwrap();
        let installed = InstalledMods::from_mods([InstalledMod::new(
            manifest,
            StorageForm::Archive,
            "/mods/z_1.0.0.zip",
        )]);

        assert!(installed.contains_version("z", &Version::new(1, 0, 0)));
        assert!(!installed.contains_version("z", &Version::new(1, 0, 1)));
        assert!(installed.get("z", &Version::new(1, 0, 0)).is_some());
        assert!(installed.versions_of("nope").is_empty());
    }
}
