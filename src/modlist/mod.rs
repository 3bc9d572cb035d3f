//! The persisted MOD list (`mod-list.json`).
//!
//! The game reads this file to decide which installed MODs are enabled and,
//! optionally, which installed version of each MOD to load:
//!
//! ```json
//! {
//!   "mods": [
//!     { "name": "base", "enabled": true },
//!     { "name": "helmod", "enabled": false, "version": "2.1.4" }
//!   ]
//! }
//! ```
//!
//! Entry order is preserved across load/save. The file is only written after a
//! plan has been executed, and always atomically.

use crate::constants::{BASE_MOD, MOD_LIST_FILE};
use crate::core::ModpmError;
use crate::version::Version;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One persisted MOD record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModListEntry {
    /// MOD name
    pub name: String,
    /// Whether the game loads this MOD
    pub enabled: bool,
    /// Pinned version, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ModListFile {
    #[serde(default)]
    mods: Vec<ModListEntry>,
}

/// Enabled flags and version pins for every known MOD.
#[derive(Debug, Clone)]
pub struct ModList {
    path: PathBuf,
    entries: Vec<ModListEntry>,
}

impl ModList {
    /// A list holding only `base`, enabled, to be saved at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: vec![ModListEntry {
                name: BASE_MOD.to_string(),
                enabled: true,
                version: None,
            }],
        }
    }

    /// Path of `mod-list.json` inside a mods directory.
    #[must_use]
    pub fn default_path(mods_dir: &Path) -> PathBuf {
        mods_dir.join(MOD_LIST_FILE)
    }

    /// Load the list from `path`, or start a fresh one when the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No MOD list at {}, starting with base only", path.display());
            return Ok(Self::new(path));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read MOD list: {}", path.display()))?;
        let file: ModListFile =
            serde_json::from_str(&content).map_err(|e| ModpmError::ModListParseError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            entries: file.mods,
        })
    }

    /// Write the list back to its path atomically.
    pub fn save(&self) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

        let file = ModListFile {
            mods: self.entries.clone(),
        };
        let content = serde_json::to_string_pretty(&file).context("Failed to serialize MOD list")?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        temp.write_all(content.as_bytes())?;
        temp.write_all(b"\n")?;
        temp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to write MOD list: {}", self.path.display()))?;

        debug!("Saved MOD list with {} entries to {}", self.entries.len(), self.path.display());
        Ok(())
    }

    /// Where the list is saved.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entry(&self, name: &str) -> Option<&ModListEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut ModListEntry> {
        self.entries.iter_mut().find(|entry| entry.name == name)
    }

    /// Whether `name` has an entry.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Whether `name` has an entry and is enabled.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.entry(name).is_some_and(|entry| entry.enabled)
    }

    /// The pinned version of `name`, if any.
    #[must_use]
    pub fn version(&self, name: &str) -> Option<Version> {
        self.entry(name).and_then(|entry| entry.version)
    }

    /// Add or overwrite the entry for `name`.
    pub fn add(&mut self, name: &str, enabled: bool, version: Option<Version>) {
        match self.entry_mut(name) {
            Some(entry) => {
                entry.enabled = enabled;
                entry.version = version;
            }
            None => self.entries.push(ModListEntry {
                name: name.to_string(),
                enabled,
                version,
            }),
        }
    }

    /// Enable `name`, adding an entry when missing.
    pub fn enable(&mut self, name: &str) {
        match self.entry_mut(name) {
            Some(entry) => entry.enabled = true,
            None => self.add(name, true, None),
        }
    }

    /// Disable `name`. Does nothing when there is no entry.
    pub fn disable(&mut self, name: &str) {
        if let Some(entry) = self.entry_mut(name) {
            entry.enabled = false;
        }
    }

    /// Remove the entry for `name`.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|entry| entry.name != name);
    }

    /// Set or clear the pinned version of an existing entry.
    pub fn set_version(&mut self, name: &str, version: Option<Version>) {
        if let Some(entry) = self.entry_mut(name) {
            entry.version = version;
        }
    }

    /// All entries in file order.
    #[must_use]
    pub fn entries(&self) -> &[ModListEntry] {
        &self.entries
    }
}
