//! Small helpers shared by the CLI, config and planners
//!
//! - [`progress`] - Progress bars for downloads
//! - [`resolve_path`] - `~` and environment variable expansion for configured paths
//! - [`find_similar_name`] - "did you mean" hints for mistyped MOD names

pub mod progress;

pub use progress::ProgressBar;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use strsim::levenshtein;

/// Maximum edit distance, as a percentage of the name length, for a hint.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Expand `~` and `$VAR` references in a configured path.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).with_context(|| {
        format!(
            "Failed to expand path: {path}\n\n\
            Use $VAR or ${{VAR}} for environment variables and '~/' for the home directory"
        )
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Create `path` and its parents when missing.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}

/// The candidate closest to `target` by edit distance, if any is close enough.
pub fn find_similar_name<'a>(
    target: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<String> {
    let limit = (target.len() * SIMILARITY_THRESHOLD_PERCENT / 100).max(1);
    candidates
        .into_iter()
        .filter(|candidate| *candidate != target)
        .map(|candidate| (levenshtein(target, candidate), candidate))
        .filter(|(distance, _)| *distance <= limit)
        .min_by_key(|(distance, candidate)| (*distance, *candidate))
        .map(|(_, candidate)| candidate.to_string())
}
