//! Command-line interface for modpm.
//!
//! Every subcommand follows the same shape: load the configuration, scan the
//! mods directory, build the dependency graph, compute a plan, print it and,
//! unless `--dry-run` was given, execute it.
//!
//! # Commands
//!
//! - `install <spec>...` - Install MODs and their missing dependencies
//! - `update [name...]` - Update installed MODs to their latest releases
//! - `uninstall <spec>... | --all` - Delete MOD versions
//! - `enable <name>...` - Enable MODs and their disabled dependencies
//! - `disable <name>... | --all` - Disable MODs and everything requiring them
//! - `check` - Report dependency problems of the enabled MOD set
//! - `list` - Show installed MODs
//!
//! # Global Options
//!
//! - `--verbose` / `--quiet` - Log level (`debug` / `error`)
//! - `--no-progress` - Hide progress bars
//! - `--config <path>` - Alternative config file
//! - `--mods-dir <dir>` / `--data-dir <dir>` - Override configured directories

mod check;
mod common;
mod disable;
mod enable;
mod install;
mod list;
mod uninstall;
mod update;

pub use check::{CheckCommand, OutputFormat};
pub use common::{CommandContext, GlobalOptions};
pub use disable::DisableCommand;
pub use enable::EnableCommand;
pub use install::InstallCommand;
pub use list::ListCommand;
pub use uninstall::UninstallCommand;
pub use update::UpdateCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Top-level command line of modpm.
#[derive(Parser)]
#[command(
    name = "modpm",
    about = "MOD package manager - install, enable, disable and uninstall game MODs",
    version,
    long_about = "modpm manages the MODs of a game installation. It resolves dependencies \
                  against the MOD registry, keeps mod-list.json consistent and refuses \
                  changes that would leave enabled MODs broken."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Hide progress bars
    #[arg(long, global = true)]
    no_progress: bool,

    /// Path to the global config file
    ///
    /// Defaults to `$MODPM_CONFIG`, then `~/.modpm/config.toml`.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding MOD archives and mod-list.json
    #[arg(long, global = true, value_name = "DIR")]
    mods_dir: Option<PathBuf>,

    /// Game data directory holding base and the expansions
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

/// Subcommands of modpm.
#[derive(Subcommand)]
pub enum Commands {
    /// Install MODs from the registry
    Install(InstallCommand),
    /// Update installed MODs to their latest compatible releases
    Update(UpdateCommand),
    /// Delete installed MOD versions
    Uninstall(UninstallCommand),
    /// Enable MODs together with their dependencies
    Enable(EnableCommand),
    /// Disable MODs together with everything requiring them
    Disable(DisableCommand),
    /// Check the enabled MOD set for dependency problems
    Check(CheckCommand),
    /// List installed MODs
    List(ListCommand),
}

impl Cli {
    /// Log filter for the chosen verbosity.
    ///
    /// `--verbose` selects `debug`, `--quiet` selects `error`, otherwise
    /// `RUST_LOG` applies with `warn` as the fallback.
    #[must_use]
    pub fn log_filter(&self) -> EnvFilter {
        if self.verbose {
            EnvFilter::new("debug")
        } else if self.quiet {
            EnvFilter::new("error")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        }
    }

    fn global_options(&self) -> GlobalOptions {
        GlobalOptions {
            config_path: self.config.clone(),
            mods_dir: self.mods_dir.clone(),
            data_dir: self.data_dir.clone(),
            no_progress: self.no_progress,
            quiet: self.quiet,
        }
    }

    /// Run the selected subcommand.
    pub async fn execute(self) -> Result<()> {
        let options = self.global_options();

        match self.command {
            Commands::Install(cmd) => cmd.execute(options).await,
            Commands::Update(cmd) => cmd.execute(options).await,
            Commands::Uninstall(cmd) => cmd.execute(options).await,
            Commands::Enable(cmd) => cmd.execute(options).await,
            Commands::Disable(cmd) => cmd.execute(options).await,
            Commands::Check(cmd) => cmd.execute(options).await,
            Commands::List(cmd) => cmd.execute(options).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "modpm",
            "install",
            "helmod@1.2.3",
            "--mods-dir",
            "/tmp/mods",
            "--no-progress",
            "--dry-run",
        ])
        .unwrap();

        let options = cli.global_options();
        assert_eq!(options.mods_dir, Some(PathBuf::from("/tmp/mods")));
        assert!(options.no_progress);
        assert!(matches!(cli.command, Commands::Install(_)));
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["modpm", "-v", "-q", "list"]).is_err());
    }

    #[test]
    fn test_uninstall_requires_targets_or_all() {
        assert!(Cli::try_parse_from(["modpm", "uninstall"]).is_err());
        assert!(Cli::try_parse_from(["modpm", "uninstall", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["modpm", "uninstall", "a", "--all"]).is_err());
    }
}
