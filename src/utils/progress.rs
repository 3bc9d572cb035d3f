//! Progress indicators for long-running operations
//!
//! A thin wrapper over `indicatif` with one consistent style. Bars are hidden
//! when the `MODPM_NO_PROGRESS` environment variable is set or when the caller
//! disables them (`--no-progress`, `--quiet`), so scripted output stays clean.
//!
//! ```rust
//! use modpm::utils::progress::ProgressBar;
//!
//! let progress = ProgressBar::new(3, false);
//! progress.set_message("Downloading");
//! progress.inc(3);
//! progress.finish_with_message("Downloaded 3 MODs");
//! ```

use crate::constants::NO_PROGRESS_ENV;
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};

/// Whether progress output is disabled through the environment.
fn is_progress_disabled() -> bool {
    std::env::var(NO_PROGRESS_ENV).is_ok()
}

fn default_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸━")
}

/// A progress bar with modpm styling.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Create a bar for `len` units of work; `hidden` suppresses all output.
    #[must_use]
    pub fn new(len: u64, hidden: bool) -> Self {
        let inner = if hidden || is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new(len);
            bar.set_style(default_style());
            bar
        };
        Self {
            inner,
        }
    }

    /// Set the text shown after the bar.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Set the text shown before the bar.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    /// Advance by `delta` units.
    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Jump to an absolute position.
    pub fn set_position(&self, pos: u64) {
        self.inner.set_position(pos);
    }

    /// Finish and replace the bar with `msg`.
    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    /// Remove the bar from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }

    /// Whether output is suppressed.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }
}
