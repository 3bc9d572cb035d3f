//! `modpm install` - install MODs and their missing dependencies.

use super::common::{CommandContext, GlobalOptions};
use crate::models::ModSpec;
use crate::resolver::InstallPlanner;
use anyhow::Result;
use clap::Args;

/// Install MODs from the registry.
///
/// Each spec is `name`, `name@latest` or `name@1.2.3`. Missing required
/// dependencies are resolved from the registry; installed but disabled ones
/// are enabled. Dependencies the registry cannot serve are skipped with a
/// warning.
#[derive(Args, Debug)]
pub struct InstallCommand {
    /// MODs to install (`name`, `name@latest` or `name@version`)
    #[arg(required = true, value_name = "SPEC")]
    specs: Vec<String>,

    /// Concurrent registry requests and downloads
    #[arg(short, long, value_name = "NUM")]
    jobs: Option<usize>,

    /// Print the plan without changing anything
    #[arg(long)]
    dry_run: bool,
}

impl InstallCommand {
    /// Run the command.
    pub async fn execute(self, options: GlobalOptions) -> Result<()> {
        let specs = self.specs.iter().map(|raw| raw.parse()).collect::<Result<Vec<ModSpec>, _>>()?;

        let mut ctx = CommandContext::load(&options, self.jobs).await?;
        let registry = ctx.registry()?;
        let plan = InstallPlanner::new(&registry)
            .with_jobs(ctx.settings.jobs)
            .plan(&mut ctx.graph, &ctx.installed, &specs)
            .await?;

        ctx.print_install_plan(&plan);
        if self.dry_run || plan.is_empty() {
            return Ok(());
        }
        ctx.execute_install_plan(&plan).await
    }
}
