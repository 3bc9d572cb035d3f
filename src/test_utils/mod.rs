//! Test utilities for modpm
//!
//! This module provides helpers shared by unit tests and the integration tests
//! under `tests/`:
//! - [`ModSetBuilder`] assembles an installed-MOD set and MOD list in memory
//! - [`MockRegistry`] is an in-memory [`RegistryClient`](crate::registry::RegistryClient)
//! - [`MockDownloader`] writes fixture archives in place of downloads
//! - [`write_mod_dir`] and [`write_mod_archive`] lay out MODs on disk
//!
//! # Example
//!
//! ```rust,no_run
//! use modpm::test_utils::ModSetBuilder;
//!
//! let state = ModSetBuilder::new()
//!     .enabled("mod-a", "1.0.0", &["mod-b"])
//!     .disabled("mod-b", "1.0.0", &[])
//!     .build();
//! let graph = state.graph();
//! assert!(graph.contains("mod-b"));
//! ```

pub mod fixtures;
pub mod registry;

pub use fixtures::{ModSetBuilder, ModState, write_builtin_dir, write_mod_archive, write_mod_dir};
pub use registry::{MockDownloader, MockRegistry};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=modpm=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
