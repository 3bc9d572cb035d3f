//! Global constants used throughout the modpm codebase.
//!
//! This module contains the distinguished MOD names, file names, retry
//! parameters and default limits that are shared across modules. Defining
//! them centrally makes magic values discoverable.

use std::time::Duration;

/// Name of the base game package.
///
/// The base package is always present and always enabled. It can never be
/// disabled or uninstalled.
pub const BASE_MOD: &str = "base";

/// Names of the official expansion packages.
///
/// Expansions ship with the game data rather than the mods directory. They can
/// be enabled and disabled, but never uninstalled or version-changed.
pub const EXPANSION_MODS: &[&str] = &["elevated-rails", "quality", "space-age"];

/// File name of the persisted MOD list inside the mods directory.
pub const MOD_LIST_FILE: &str = "mod-list.json";

/// File name of a MOD manifest inside an archive or extracted directory.
pub const MANIFEST_FILE: &str = "info.json";

/// Default registry base URL.
pub const DEFAULT_REGISTRY_URL: &str = "https://mods.factorio.com";

/// Default number of concurrent registry and download operations.
pub const DEFAULT_JOBS: usize = 4;

/// Maximum number of attempts for a transient registry failure.
pub const REGISTRY_MAX_ATTEMPTS: usize = 4;

/// Starting delay for exponential backoff (50ms).
///
/// This is the initial delay used in exponential backoff calculations,
/// which doubles on each retry attempt.
pub const STARTING_BACKOFF_DELAY_MS: u64 = 50;

/// Maximum backoff delay for exponential backoff (2s).
pub const MAX_BACKOFF_DELAY_MS: u64 = 2_000;

/// Timeout for a single registry metadata request (30 seconds).
pub const REGISTRY_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for a single archive download (10 minutes).
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Environment variable that disables progress indicators when set.
pub const NO_PROGRESS_ENV: &str = "MODPM_NO_PROGRESS";

/// Environment variable that overrides the global config path.
pub const CONFIG_PATH_ENV: &str = "MODPM_CONFIG";
