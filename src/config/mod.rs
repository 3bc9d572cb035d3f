//! Configuration management for modpm
//!
//! modpm reads one configuration file, the user-wide [`GlobalConfig`]. Command
//! line flags take precedence over it; [`Settings`] is the merged result every
//! command works from.
//!
//! # Precedence
//!
//! 1. Command line flags (`--mods-dir`, `--data-dir`, `--jobs`)
//! 2. `config.toml` (`--config`, `MODPM_CONFIG` or `~/.modpm/config.toml`)
//! 3. Built-in defaults (public registry, 4 jobs)
//!
//! The mods directory has no default; commands fail with a hint when neither
//! the flag nor the config file names one.

pub mod global;

pub use global::GlobalConfig;

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Command line values that override the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--mods-dir`
    pub mods_dir: Option<PathBuf>,
    /// `--data-dir`
    pub data_dir: Option<PathBuf>,
    /// `--jobs`
    pub jobs: Option<usize>,
}

/// Effective settings for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding MOD archives and `mod-list.json`
    pub mods_dir: PathBuf,
    /// Game data directory, when known
    pub data_dir: Option<PathBuf>,
    /// Registry root URL
    pub registry_url: String,
    /// Registry account name
    pub username: Option<String>,
    /// Registry token
    pub token: Option<String>,
    /// Concurrency limit
    pub jobs: usize,
}

impl Settings {
    /// Merge `config` with command line `overrides`.
    pub fn resolve(config: &GlobalConfig, overrides: Overrides) -> Result<Self> {
        let mods_dir = match overrides.mods_dir {
            Some(dir) => dir,
            None => config.mods_dir()?.context(
                "No mods directory configured\n\n\
                Pass --mods-dir <dir> or set mods_dir in ~/.modpm/config.toml",
            )?,
        };
        let data_dir = match overrides.data_dir {
            Some(dir) => Some(dir),
            None => config.data_dir()?,
        };

        Ok(Self {
            mods_dir,
            data_dir,
            registry_url: config.registry_url().to_string(),
            username: config.username.clone(),
            token: config.token.clone(),
            jobs: overrides.jobs.unwrap_or_else(|| config.jobs()).max(1),
        })
    }
}
