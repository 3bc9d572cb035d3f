//! `modpm update` - update installed MODs.

use super::common::{CommandContext, GlobalOptions};
use crate::models::ModId;
use crate::resolver::InstallPlanner;
use anyhow::Result;
use clap::Args;

/// Update installed MODs to their latest compatible releases.
///
/// Without names every installed MOD is checked. Older versions stay on disk;
/// the MOD list pin moves to the new release.
#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// MODs to update (all installed MODs when omitted)
    #[arg(value_name = "NAME")]
    names: Vec<String>,

    /// Concurrent registry requests and downloads
    #[arg(short, long, value_name = "NUM")]
    jobs: Option<usize>,

    /// Print the plan without changing anything
    #[arg(long)]
    dry_run: bool,
}

impl UpdateCommand {
    /// Run the command.
    pub async fn execute(self, options: GlobalOptions) -> Result<()> {
        let names: Vec<ModId> = self.names.iter().map(|name| ModId::new(name.as_str())).collect();

        let mut ctx = CommandContext::load(&options, self.jobs).await?;
        let registry = ctx.registry()?;
        let plan = InstallPlanner::new(&registry)
            .with_jobs(ctx.settings.jobs)
            .plan_update(&mut ctx.graph, &ctx.installed, &names)
            .await?;

        ctx.print_install_plan(&plan);
        if self.dry_run || plan.is_empty() {
            return Ok(());
        }
        ctx.execute_install_plan(&plan).await
    }
}
