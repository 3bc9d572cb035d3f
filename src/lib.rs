//! modpm - MOD package manager
//!
//! A dependency-aware manager for the MODs of a game installation. It installs
//! MODs from the MOD registry, enables and disables them in `mod-list.json`
//! and uninstalls them, refusing any change that would leave an enabled MOD
//! without its required dependencies.
//!
//! # Architecture Overview
//!
//! Every operation works on a [`resolver::DependencyGraph`] built from two
//! sources of local state:
//! - the artifacts in the mods directory (and the game data directory), read
//!   by [`installed::InstalledMods::scan`]
//! - the persisted enabled flags and version pins of [`modlist::ModList`]
//!
//! Planners in [`resolver`] turn a request into a plan without touching the
//! disk; [`installer`] executes plans. Install planning talks to the registry
//! through the [`registry::RegistryClient`] trait, fetching metadata
//! concurrently in rounds until every reachable dependency is known.
//!
//! # Core Modules
//!
//! - [`version`] - Versions and version requirements
//! - [`manifest`] - `info.json` manifests and dependency strings
//! - [`models`] - MOD identities and command line specs
//! - [`installed`] - Installed artifact enumeration
//! - [`modlist`] - `mod-list.json` persistence
//! - [`registry`] - Registry metadata and the HTTP client
//! - [`resolver`] - Dependency graph, validator and planners
//! - [`installer`] - Downloads and plan execution
//!
//! ## Supporting Modules
//! - [`cli`] - Command-line interface
//! - [`config`] - Global configuration (`~/.modpm/config.toml`)
//! - [`core`] - Error types and user-facing error reporting
//! - [`utils`] - Paths, name hints and progress bars
//! - [`constants`] - Distinguished names, defaults and limits
//!
//! # Dependency strings
//!
//! Manifests declare dependencies as `[prefix] name [op version]`:
//!
//! | Prefix | Kind            | Effect on planning                    |
//! |--------|-----------------|---------------------------------------|
//! | none   | required        | must be installed, enabled, satisfied |
//! | `?`    | optional        | recorded only                         |
//! | `(?)`  | hidden optional | recorded only                         |
//! | `!`    | incompatible    | may not be enabled together           |
//! | `~`    | load-neutral    | recorded only                         |
//!
//! # Example
//!
//! ```rust,no_run
//! use modpm::installed::InstalledMods;
//! use modpm::modlist::ModList;
//! use modpm::resolver::{DependencyGraph, validate};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mods_dir = Path::new("/games/factorio/mods");
//! let installed = InstalledMods::scan(mods_dir, None)?;
//! let mod_list = ModList::load(&ModList::default_path(mods_dir))?;
//! let graph = DependencyGraph::build(&installed, &mod_list);
//!
//! for issue in validate(&graph, &mod_list, &installed).errors {
//!     println!("{}", issue.message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod installed;
pub mod installer;
pub mod manifest;
pub mod models;
pub mod modlist;
pub mod registry;
pub mod resolver;
pub mod utils;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
