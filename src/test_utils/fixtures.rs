//! Builders for installed-MOD sets, MOD lists and on-disk MOD layouts.

use crate::installed::{InstalledMod, InstalledMods, StorageForm};
use crate::manifest::ModManifest;
use crate::modlist::ModList;
use crate::resolver::DependencyGraph;
use crate::version::Version;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

fn version(raw: &str) -> Version {
    raw.parse().unwrap_or_else(|e| panic!("bad fixture version '{raw}': {e}"))
}

fn manifest(name: &str, raw_version: &str, deps: &[&str]) -> ModManifest {
    ModManifest::new(name, version(raw_version), deps)
        .unwrap_or_else(|e| panic!("bad fixture dependencies for '{name}': {e}"))
}

fn info_json(name: &str, version: &str, deps: &[&str]) -> String {
    serde_json::json!({
        "name": name,
        "version": version,
        "title": name,
        "author": "fixture",
        "factorio_version": "2.0",
        "dependencies": deps,
    })
    .to_string()
}

/// In-memory installed-MOD set plus MOD list.
#[derive(Debug, Clone)]
pub struct ModState {
    /// Installed artifacts
    pub installed: InstalledMods,
    /// Persisted flags and pins
    pub mod_list: ModList,
}

impl ModState {
    /// Build the dependency graph for this state.
    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::build(&self.installed, &self.mod_list)
    }
}

/// Fluent builder for [`ModState`].
///
/// Dependencies are raw manifest strings (`"mod-b >= 1.0"`, `"! mod-c"`).
/// Without an explicit [`base`](Self::base) call no base node exists, which
/// makes every required edge to `base` pass.
#[derive(Debug, Clone)]
pub struct ModSetBuilder {
    mods: Vec<InstalledMod>,
    mod_list: ModList,
}

impl Default for ModSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModSetBuilder {
    /// Start with an empty installed set and a MOD list holding only `base`.
    pub fn new() -> Self {
        Self {
            mods: Vec::new(),
            mod_list: ModList::new("mod-list.json"),
        }
    }

    fn artifact(mut self, name: &str, raw_version: &str, deps: &[&str]) -> Self {
        let path = format!("/mods/{name}_{raw_version}.zip");
        self.mods.push(InstalledMod::new(
            manifest(name, raw_version, deps),
            StorageForm::Archive,
            path,
        ));
        self
    }

    /// Install the base game at `raw_version`.
    pub fn base(self, raw_version: &str) -> Self {
        self.artifact("base", raw_version, &[])
    }

    /// Install an expansion at `raw_version` and list it as enabled.
    pub fn expansion(self, name: &str, raw_version: &str) -> Self {
        self.enabled(name, raw_version, &["base"])
    }

    /// Install a MOD and list it as enabled.
    pub fn enabled(mut self, name: &str, raw_version: &str, deps: &[&str]) -> Self {
        self.mod_list.add(name, true, None);
        self.artifact(name, raw_version, deps)
    }

    /// Install a MOD and list it as disabled.
    pub fn disabled(mut self, name: &str, raw_version: &str, deps: &[&str]) -> Self {
        self.mod_list.add(name, false, None);
        self.artifact(name, raw_version, deps)
    }

    /// Install a MOD without a MOD list entry.
    pub fn unlisted(self, name: &str, raw_version: &str, deps: &[&str]) -> Self {
        self.artifact(name, raw_version, deps)
    }

    /// List a MOD that is not installed.
    pub fn listed(mut self, name: &str, enabled: bool) -> Self {
        self.mod_list.add(name, enabled, None);
        self
    }

    /// Pin the listed version of `name`.
    pub fn pinned(mut self, name: &str, raw_version: &str) -> Self {
        self.mod_list.set_version(name, Some(version(raw_version)));
        self
    }

    /// Finish the state.
    pub fn build(self) -> ModState {
        ModState {
            installed: InstalledMods::from_mods(self.mods),
            mod_list: self.mod_list,
        }
    }
}

/// Write an extracted MOD directory `name_version/info.json` under `mods_dir`.
pub fn write_mod_dir(mods_dir: &Path, name: &str, version: &str, deps: &[&str]) -> PathBuf {
    let dir = mods_dir.join(format!("{name}_{version}"));
    fs::create_dir_all(&dir).expect("create MOD directory");
    fs::write(dir.join("info.json"), info_json(name, version, deps)).expect("write info.json");
    dir
}

/// Write a zipped MOD `name_version.zip` under `mods_dir`.
pub fn write_mod_archive(mods_dir: &Path, name: &str, version: &str, deps: &[&str]) -> PathBuf {
    fs::create_dir_all(mods_dir).expect("create mods directory");
    let path = mods_dir.join(format!("{name}_{version}.zip"));
    let file = fs::File::create(&path).expect("create archive");
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    writer
        .start_file(format!("{name}_{version}/info.json"), options)
        .expect("start archive entry");
    writer.write_all(info_json(name, version, deps).as_bytes()).expect("write info.json");
    writer.finish().expect("finish archive");
    path
}

/// Write a builtin MOD the way the game data directory stores it: `name/info.json`.
pub fn write_builtin_dir(data_dir: &Path, name: &str, version: &str) -> PathBuf {
    let dir = data_dir.join(name);
    let deps: &[&str] = if name == crate::constants::BASE_MOD { &[] } else { &["base"] };
    fs::create_dir_all(&dir).expect("create builtin directory");
    fs::write(dir.join("info.json"), info_json(name, version, deps)).expect("write info.json");
    dir
}
