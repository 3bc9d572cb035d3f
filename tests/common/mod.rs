//! Common fixtures for modpm integration tests
//!
//! [`TestMods`] owns a temporary game layout (mods directory, data directory
//! and a config path that does not exist) and runs the `modpm` binary against
//! it.

// Not every test binary uses every helper
#![allow(dead_code)]

use assert_cmd::Command;
use modpm::modlist::ModList;
use modpm::test_utils::{write_builtin_dir, write_mod_archive, write_mod_dir};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary mods and data directories.
pub struct TestMods {
    temp: TempDir,
}

impl TestMods {
    /// Create empty `mods/` and `data/` directories with `base` 2.0.28.
    pub fn new() -> Self {
        modpm::test_utils::init_test_logging(None);
        let temp = TempDir::new().expect("create temp dir");
        fs::create_dir_all(temp.path().join("mods")).expect("create mods dir");
        let mods = Self {
            temp,
        };
        write_builtin_dir(&mods.data_dir(), "base", "2.0.28");
        mods
    }

    /// Root of the layout.
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// The mods directory.
    pub fn mods_dir(&self) -> PathBuf {
        self.temp.path().join("mods")
    }

    /// The game data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.temp.path().join("data")
    }

    /// Path of the global config file used by [`cmd`](Self::cmd).
    pub fn config_path(&self) -> PathBuf {
        self.temp.path().join("config.toml")
    }

    /// Install `name` as an archive.
    pub fn archive(&self, name: &str, version: &str, deps: &[&str]) -> PathBuf {
        write_mod_archive(&self.mods_dir(), name, version, deps)
    }

    /// Install `name` as an extracted directory.
    pub fn directory(&self, name: &str, version: &str, deps: &[&str]) -> PathBuf {
        write_mod_dir(&self.mods_dir(), name, version, deps)
    }

    /// Install an expansion into the data directory.
    pub fn expansion(&self, name: &str) -> PathBuf {
        write_builtin_dir(&self.data_dir(), name, "2.0.28")
    }

    /// Write `mod-list.json` with `(name, enabled)` entries.
    pub fn write_mod_list(&self, entries: &[(&str, bool)]) {
        let mut mod_list = ModList::new(ModList::default_path(&self.mods_dir()));
        for (name, enabled) in entries {
            mod_list.add(name, *enabled, None);
        }
        mod_list.save().expect("save mod list");
    }

    /// Read back `mod-list.json`.
    pub fn mod_list(&self) -> ModList {
        ModList::load(&ModList::default_path(&self.mods_dir())).expect("load mod list")
    }

    /// `modpm` with this layout's directories and no progress bars.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("modpm").expect("modpm binary");
        cmd.env_remove("MODPM_CONFIG")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.config_path())
            .arg("--mods-dir")
            .arg(self.mods_dir())
            .arg("--data-dir")
            .arg(self.data_dir())
            .arg("--no-progress");
        cmd
    }
}
