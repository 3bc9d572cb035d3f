//! `modpm enable` - enable MODs with their dependencies.

use super::common::{CommandContext, GlobalOptions, print_names};
use crate::installer::apply_enable_plan;
use crate::models::ModId;
use crate::resolver::plan_enable;
use anyhow::Result;
use clap::Args;

/// Enable MODs together with their disabled required dependencies.
#[derive(Args, Debug)]
pub struct EnableCommand {
    /// MODs to enable
    #[arg(required = true, value_name = "NAME")]
    names: Vec<String>,

    /// Print the plan without changing anything
    #[arg(long)]
    dry_run: bool,
}

impl EnableCommand {
    /// Run the command.
    pub async fn execute(self, options: GlobalOptions) -> Result<()> {
        let mut ctx = CommandContext::load(&options, None).await?;
        let targets: Vec<ModId> = self.names.iter().map(|name| ModId::new(name.as_str())).collect();

        let plan = plan_enable(&ctx.graph, &targets)?;
        if plan.mods.is_empty() {
            ctx.say("Nothing to do");
            return Ok(());
        }

        print_names(&ctx, "Enable:", &plan.mods);
        if self.dry_run {
            return Ok(());
        }

        apply_enable_plan(&plan, &mut ctx.mod_list)?;
        ctx.success(format!("Enabled {} MODs", plan.mods.len()));
        Ok(())
    }
}
