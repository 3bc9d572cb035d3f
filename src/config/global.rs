//! Global configuration for modpm.
//!
//! The global configuration lives at `~/.modpm/config.toml` and holds
//! user-wide settings: where the game keeps its MODs, where the game data
//! lives, which registry to talk to and the registry credentials used for
//! downloads. It is never shared, since it may contain a token.
//!
//! # Location
//!
//! - **Unix/macOS**: `~/.modpm/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\modpm\config.toml`
//! - **Override**: `--config <path>` or the `MODPM_CONFIG` environment variable
//!
//! # File Format
//!
//! ```toml
//! mods_dir = "~/.factorio/mods"
//! data_dir = "~/games/factorio/data"
//! registry_url = "https://mods.factorio.com"
//! username = "engineer"
//! token = "0123456789abcdef"
//! jobs = 8
//! ```
//!
//! Every field is optional. Path fields expand `~` and `$VAR` references when
//! resolved, not when loaded, so the file round-trips unchanged.

use crate::constants::{CONFIG_PATH_ENV, DEFAULT_JOBS, DEFAULT_REGISTRY_URL};
use crate::utils::resolve_path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// User-wide settings read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Directory holding MOD archives and `mod-list.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mods_dir: Option<String>,

    /// Game data directory holding `base` and the expansions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// Registry root URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,

    /// Registry account name, sent with downloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Registry token, sent with downloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Concurrent registry requests and downloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl GlobalConfig {
    /// Load from `path`, the `MODPM_CONFIG` path or the default location.
    ///
    /// A missing file yields the default configuration.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))
    }

    /// Save to `path`, creating parent directories.
    ///
    /// The file is written to a temporary sibling first and renamed into
    /// place. On Unix it is readable by the owner only.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
        let parent = parent.unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;

        let content = toml::to_string_pretty(self).context("Failed to serialize global config")?;

        let temp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
        fs::write(temp.path(), content)
            .await
            .with_context(|| format!("Failed to write global config to {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let perms = std::fs::Permissions::from_mode(0o600);
            fs::set_permissions(temp.path(), perms).await.with_context(|| {
                format!("Failed to set secure permissions on {}", path.display())
            })?;
        }

        temp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace global config at {}", path.display()))?;
        Ok(())
    }

    /// The config path: `MODPM_CONFIG` when set, otherwise the platform default.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return resolve_path(&path);
        }

        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("modpm")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".modpm")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Expanded mods directory, if configured.
    pub fn mods_dir(&self) -> Result<Option<PathBuf>> {
        self.mods_dir.as_deref().map(resolve_path).transpose()
    }

    /// Expanded game data directory, if configured.
    pub fn data_dir(&self) -> Result<Option<PathBuf>> {
        self.data_dir.as_deref().map(resolve_path).transpose()
    }

    /// Registry root URL, falling back to the public registry.
    #[must_use]
    pub fn registry_url(&self) -> &str {
        self.registry_url.as_deref().unwrap_or(DEFAULT_REGISTRY_URL)
    }

    /// Concurrency limit, falling back to the default.
    #[must_use]
    pub fn jobs(&self) -> usize {
        self.jobs.unwrap_or(DEFAULT_JOBS).max(1)
    }
}
