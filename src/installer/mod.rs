//! Plan execution for modpm.
//!
//! Planners in [`crate::resolver`] only describe changes. This module carries
//! them out against the mods directory and the MOD list:
//!
//! - **Install plans** download every selected release concurrently (bounded by
//!   `jobs`), then add each MOD to the MOD list with its version pinned and
//!   enable the MODs marked for enabling
//! - **Enable and disable plans** flip MOD list flags
//! - **Uninstall plans** delete artifacts, then drop the MOD list entry or
//!   move its pin to a remaining version
//!
//! In every case the MOD list is saved once, after all changes are applied.
//! A failed download leaves the MOD list untouched and removes the archives
//! that the same plan already downloaded.
//!
//! # Example
//!
//! ```rust,no_run
//! use modpm::installer::{HttpDownloader, PlanExecutor};
//! use modpm::modlist::ModList;
//! use modpm::resolver::InstallPlan;
//! use std::path::Path;
//!
//! # async fn example(plan: InstallPlan) -> anyhow::Result<()> {
//! let mods_dir = Path::new("/games/factorio/mods");
//! let downloader = HttpDownloader::new("https://mods.factorio.com", None, None)?;
//! let mut mod_list = ModList::load(&ModList::default_path(mods_dir))?;
//!
//! let executor = PlanExecutor::new(&downloader, mods_dir).with_jobs(8);
//! let downloaded = executor.execute_install(&plan, &mut mod_list).await?;
//! println!("Downloaded {downloaded} MODs");
//! # Ok(())
//! # }
//! ```

mod download;

pub use download::{Downloader, HttpDownloader};

use crate::constants::DEFAULT_JOBS;
use crate::models::ModId;
use crate::modlist::ModList;
use crate::registry::Release;
use crate::resolver::{DisablePlan, EnablePlan, InstallPlan, PlanAction, UninstallPlan};
use crate::utils::{ProgressBar, ensure_dir};
use anyhow::{Context, Result};
use futures::{StreamExt, stream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Applies install plans using a [`Downloader`].
pub struct PlanExecutor<'a, D: Downloader> {
    downloader: &'a D,
    mods_dir: PathBuf,
    jobs: usize,
    show_progress: bool,
}

impl<'a, D: Downloader> PlanExecutor<'a, D> {
    /// Create an executor writing into `mods_dir`.
    pub fn new(downloader: &'a D, mods_dir: impl Into<PathBuf>) -> Self {
        Self {
            downloader,
            mods_dir: mods_dir.into(),
            jobs: DEFAULT_JOBS,
            show_progress: false,
        }
    }

    /// Limit concurrent downloads.
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Show a download progress bar.
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Download the plan's releases and record the result in `mod_list`.
    ///
    /// Returns the number of archives downloaded.
    pub async fn execute_install(&self, plan: &InstallPlan, mod_list: &mut ModList) -> Result<usize> {
        let downloads: Vec<(&ModId, &Release)> = plan.downloads().collect();
        if !downloads.is_empty() {
            ensure_dir(&self.mods_dir)?;
        }

        let total = downloads.len();
        let progress = ProgressBar::new(total as u64, !self.show_progress);
        progress.set_prefix("Downloading");
        let completed = AtomicUsize::new(0);

        let results: Vec<(ModId, Result<PathBuf>)> = stream::iter(downloads)
            .map(|(id, release)| {
                let progress = &progress;
                let completed = &completed;
                async move {
                    let result = self
                        .downloader
                        .download(release, &self.mods_dir)
                        .await
                        .with_context(|| format!("Failed to download {id}@{}", release.version));

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.set_message(id.to_string());
                    progress.set_position(done as u64);
                    debug!("Download {done}/{total} finished: {id}");
                    (id.clone(), result)
                }
            })
            .buffer_unordered(self.jobs)
            .collect()
            .await;

        let mut written = Vec::new();
        let mut failure = None;
        for (id, result) in results {
            match result {
                Ok(path) => written.push(path),
                Err(e) => {
                    warn!("Download of '{id}' failed: {e:#}");
                    failure.get_or_insert(e);
                }
            }
        }

        if let Some(error) = failure {
            progress.finish_and_clear();
            for path in &written {
                if let Err(e) = remove_artifact(path) {
                    warn!("Failed to clean up {}: {e:#}", path.display());
                }
            }
            return Err(error);
        }
        progress.finish_with_message(format!("Downloaded {total} MODs"));

        for item in &plan.items {
            match &item.action {
                PlanAction::Install {
                    release,
                    enable,
                } => mod_list.add(item.id.as_str(), *enable, Some(release.version)),
                PlanAction::Enable => mod_list.enable(item.id.as_str()),
            }
        }
        mod_list.save()?;

        info!("Installed {} MODs, {} steps applied", written.len(), plan.items.len());
        Ok(written.len())
    }
}

/// Enable every MOD of `plan` and save the MOD list.
pub fn apply_enable_plan(plan: &EnablePlan, mod_list: &mut ModList) -> Result<()> {
    for id in &plan.mods {
        mod_list.enable(id.as_str());
    }
    mod_list.save()
}

/// Disable every MOD of `plan` and save the MOD list.
pub fn apply_disable_plan(plan: &DisablePlan, mod_list: &mut ModList) -> Result<()> {
    for id in &plan.mods {
        mod_list.disable(id.as_str());
    }
    mod_list.save()
}

/// Delete the plan's artifacts, update the MOD list and save it.
///
/// Stops at the first artifact that cannot be deleted; the MOD list is still
/// saved with the changes of the items completed so far.
pub fn apply_uninstall_plan(plan: &UninstallPlan, mod_list: &mut ModList) -> Result<()> {
    let mut result = Ok(());

    for item in &plan.items {
        if item.disable_only {
            mod_list.disable(item.id.as_str());
            continue;
        }

        let removed = item.artifacts.iter().try_for_each(|artifact| {
            debug!("Removing {}", artifact.path.display());
            remove_artifact(&artifact.path)
        });
        if let Err(e) = removed {
            result = Err(e.context(format!("Failed to uninstall '{}'", item.id)));
            break;
        }

        if item.remove_entry {
            mod_list.remove(item.id.as_str());
        } else if let Some(pin) = item.new_pin {
            mod_list.set_version(item.id.as_str(), Some(pin));
        }
    }

    mod_list.save()?;
    result
}

/// Delete an archive or an extracted MOD directory.
fn remove_artifact(path: &Path) -> Result<()> {
    let removed =
        if path.is_dir() { std::fs::remove_dir_all(path) } else { std::fs::remove_file(path) };
    removed.with_context(|| format!("Failed to remove {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installed::InstalledMods;
    use crate::resolver::{DependencyGraph, InstallPlanner, plan_uninstall};
    use crate::test_utils::{MockDownloader, MockRegistry, write_mod_archive, write_mod_dir};
    use crate::version::Version;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_install_downloads_and_pins() {
        let temp = TempDir::new().unwrap();
        let mods_dir = temp.path().join("mods");
        let registry = MockRegistry::new()
            .with_release("a", "1.0.0", &["base", "c"])
            .with_release("c", "2.1.0", &["base"]);
        let mut mod_list = ModList::load(&ModList::default_path(&mods_dir)).unwrap();
        let installed = InstalledMods::new();
        let mut graph = DependencyGraph::build(&installed, &mod_list);

        let plan = InstallPlanner::new(&registry)
            .plan(&mut graph, &installed, &["a".parse().unwrap()])
            .await
            .unwrap();
        let downloader = MockDownloader::new();
        let count = PlanExecutor::new(&downloader, &mods_dir)
            .execute_install(&plan, &mut mod_list)
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert!(mods_dir.join("a_1.0.0.zip").exists());
        assert!(mods_dir.join("c_2.1.0.zip").exists());

        let reloaded = ModList::load(&ModList::default_path(&mods_dir)).unwrap();
        assert!(reloaded.is_enabled("a"));
        assert_eq!(reloaded.version("c"), Some(Version::new(2, 1, 0)));

        let rescanned = InstalledMods::scan(&mods_dir, None).unwrap();
        assert!(rescanned.contains_version("c", &Version::new(2, 1, 0)));
    }

    #[tokio::test]
    async fn test_failed_download_leaves_state_untouched() {
        let temp = TempDir::new().unwrap();
        let mods_dir = temp.path().to_path_buf();
        let registry = MockRegistry::new()
            .with_release("a", "1.0.0", &["c"])
            .with_release("c", "1.0.0", &[]);
        let mut mod_list = ModList::new(ModList::default_path(&mods_dir));
        let installed = InstalledMods::new();
        let mut graph = DependencyGraph::build(&installed, &mod_list);

        let plan = InstallPlanner::new(&registry)
            .plan(&mut graph, &installed, &["a".parse().unwrap()])
            .await
            .unwrap();
        let downloader = MockDownloader::new().failing("a");
        let err = PlanExecutor::new(&downloader, &mods_dir)
            .with_jobs(1)
            .execute_install(&plan, &mut mod_list)
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("Failed to download a@1.0.0"));
        assert!(!mods_dir.join("c_1.0.0.zip").exists());
        assert!(!mod_list.exists("a"));
        assert!(!ModList::default_path(&mods_dir).exists());
    }

    #[test]
    fn test_uninstall_removes_artifacts_and_moves_pin() {
        let temp = TempDir::new().unwrap();
        let mods_dir = temp.path();
        write_mod_archive(mods_dir, "x", "1.0.0", &[]);
        write_mod_dir(mods_dir, "x", "2.0.0", &[]);
        write_mod_archive(mods_dir, "y", "1.0.0", &[]);

        let mut mod_list = ModList::new(ModList::default_path(mods_dir));
        mod_list.add("x", true, Some(Version::new(2, 0, 0)));
        mod_list.add("y", false, None);
        let installed = InstalledMods::scan(mods_dir, None).unwrap();
        let graph = DependencyGraph::build(&installed, &mod_list);

        let specs = ["x@2.0.0".parse().unwrap(), "y".parse().unwrap()];
        let plan = plan_uninstall(&graph, &installed, &mod_list, &specs).unwrap();
        apply_uninstall_plan(&plan, &mut mod_list).unwrap();

        assert!(!mods_dir.join("x_2.0.0").exists());
        assert!(mods_dir.join("x_1.0.0.zip").exists());
        assert!(!mods_dir.join("y_1.0.0.zip").exists());

        let reloaded = ModList::load(&ModList::default_path(mods_dir)).unwrap();
        assert_eq!(reloaded.version("x"), Some(Version::new(1, 0, 0)));
        assert!(!reloaded.exists("y"));
    }

    #[test]
    fn test_enable_and_disable_plans_flip_flags() {
        let temp = TempDir::new().unwrap();
        let mut mod_list = ModList::new(ModList::default_path(temp.path()));
        mod_list.add("a", false, None);

        apply_enable_plan(
            &EnablePlan {
                mods: vec![ModId::new("a"), ModId::new("b")],
            },
            &mut mod_list,
        )
        .unwrap();
        assert!(mod_list.is_enabled("a"));
        assert!(mod_list.is_enabled("b"));

        apply_disable_plan(
            &DisablePlan {
                mods: vec![ModId::new("a")],
            },
            &mut mod_list,
        )
        .unwrap();
        let reloaded = ModList::load(&ModList::default_path(temp.path())).unwrap();
        assert!(!reloaded.is_enabled("a"));
        assert!(reloaded.is_enabled("b"));
    }
}
