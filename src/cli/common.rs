//! Shared state and output helpers for CLI commands

use crate::config::{GlobalConfig, Overrides, Settings};
use crate::installed::InstalledMods;
use crate::installer::{HttpDownloader, PlanExecutor};
use crate::modlist::ModList;
use crate::registry::HttpRegistry;
use crate::resolver::{DependencyGraph, InstallPlan, PlanAction};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

/// Global flags shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// `--config`
    pub config_path: Option<PathBuf>,
    /// `--mods-dir`
    pub mods_dir: Option<PathBuf>,
    /// `--data-dir`
    pub data_dir: Option<PathBuf>,
    /// `--no-progress`
    pub no_progress: bool,
    /// `--quiet`
    pub quiet: bool,
}

/// Everything a command needs: settings plus the scanned local state.
#[derive(Debug)]
pub struct CommandContext {
    /// Effective settings
    pub settings: Settings,
    /// Installed artifacts
    pub installed: InstalledMods,
    /// MOD list of the mods directory
    pub mod_list: ModList,
    /// Graph over `installed` and `mod_list`
    pub graph: DependencyGraph,
    quiet: bool,
    no_progress: bool,
}

impl CommandContext {
    /// Load config, scan the mods directory and build the graph.
    pub async fn load(options: &GlobalOptions, jobs: Option<usize>) -> Result<Self> {
        let config = GlobalConfig::load_with_optional(options.config_path.clone()).await?;
        let settings = Settings::resolve(
            &config,
            Overrides {
                mods_dir: options.mods_dir.clone(),
                data_dir: options.data_dir.clone(),
                jobs,
            },
        )?;

        let installed = InstalledMods::scan(&settings.mods_dir, settings.data_dir.as_deref())
            .with_context(|| format!("Failed to scan {}", settings.mods_dir.display()))?;
        let mod_list = ModList::load(&ModList::default_path(&settings.mods_dir))?;
        let graph = DependencyGraph::build(&installed, &mod_list);
        debug!(
            "Loaded {} installed MODs, {} graph nodes, {} edges",
            installed.len(),
            graph.len(),
            graph.edge_count()
        );

        Ok(Self {
            settings,
            installed,
            mod_list,
            graph,
            quiet: options.quiet,
            no_progress: options.no_progress,
        })
    }

    /// Whether informational output is suppressed.
    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Print an informational line unless `--quiet` was given.
    pub fn say(&self, message: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", message.as_ref());
        }
    }

    /// Print a success line unless `--quiet` was given.
    pub fn success(&self, message: impl AsRef<str>) {
        self.say(format!("{} {}", "✓".green(), message.as_ref()));
    }

    /// Registry client for the configured registry.
    pub fn registry(&self) -> Result<HttpRegistry> {
        HttpRegistry::new(self.settings.registry_url.as_str())
    }

    /// Print an install or update plan.
    pub fn print_install_plan(&self, plan: &InstallPlan) {
        for (id, version) in &plan.already_installed {
            self.say(format!("{id}@{version} is already installed"));
        }
        for warning in &plan.warnings {
            eprintln!("{} {warning}", "warning:".yellow().bold());
        }
        if plan.is_empty() {
            self.say("Nothing to do");
            return;
        }

        self.say(format!("{}", "Plan:".bold()));
        for item in &plan.items {
            let line = match &item.action {
                PlanAction::Install {
                    release,
                    enable: true,
                } => format!("  {} {}@{}", "install".green(), item.id, release.version),
                PlanAction::Install {
                    release,
                    enable: false,
                } => format!("  {} {}@{} (stays disabled)", "install".green(), item.id, release.version),
                PlanAction::Enable => format!("  {} {}", "enable".cyan(), item.id),
            };
            self.say(line);
        }
    }

    /// Download and record an install plan.
    pub async fn execute_install_plan(&mut self, plan: &InstallPlan) -> Result<()> {
        let downloader = HttpDownloader::new(
            self.settings.registry_url.as_str(),
            self.settings.username.clone(),
            self.settings.token.clone(),
        )?;

        let downloaded = PlanExecutor::new(&downloader, &self.settings.mods_dir)
            .with_jobs(self.settings.jobs)
            .with_progress(!self.no_progress && !self.quiet)
            .execute_install(plan, &mut self.mod_list)
            .await?;

        let enabled = plan.items.iter().filter(|item| item.action == PlanAction::Enable).count();
        self.success(format!("Downloaded {downloaded} MODs, enabled {enabled}"));
        Ok(())
    }
}

/// Print a bullet list of names under a heading, unless quiet.
pub fn print_names<'a>(
    ctx: &CommandContext,
    heading: &str,
    names: impl IntoIterator<Item = &'a crate::models::ModId>,
) {
    ctx.say(format!("{}", heading.bold()));
    for name in names {
        ctx.say(format!("  {name}"));
    }
}
