//! `modpm disable` - disable MODs with everything requiring them.

use super::common::{CommandContext, GlobalOptions, print_names};
use crate::installer::apply_disable_plan;
use crate::models::ModId;
use crate::resolver::{plan_disable, plan_disable_all};
use anyhow::Result;
use clap::Args;

/// Disable MODs together with every enabled MOD requiring them.
///
/// `base` cannot be disabled. `--all` disables everything except `base`.
#[derive(Args, Debug)]
pub struct DisableCommand {
    /// MODs to disable
    #[arg(value_name = "NAME", required_unless_present = "all", conflicts_with = "all")]
    names: Vec<String>,

    /// Disable every MOD except base
    #[arg(long)]
    all: bool,

    /// Print the plan without changing anything
    #[arg(long)]
    dry_run: bool,
}

impl DisableCommand {
    /// Run the command.
    pub async fn execute(self, options: GlobalOptions) -> Result<()> {
        let mut ctx = CommandContext::load(&options, None).await?;

        let plan = if self.all {
            plan_disable_all(&ctx.graph)
        } else {
            let targets: Vec<ModId> =
                self.names.iter().map(|name| ModId::new(name.as_str())).collect();
            plan_disable(&ctx.graph, &targets)?
        };

        if plan.mods.is_empty() {
            ctx.say("Nothing to do");
            return Ok(());
        }

        print_names(&ctx, "Disable:", &plan.mods);
        if self.dry_run {
            return Ok(());
        }

        apply_disable_plan(&plan, &mut ctx.mod_list)?;
        ctx.success(format!("Disabled {} MODs", plan.mods.len()));
        Ok(())
    }
}
