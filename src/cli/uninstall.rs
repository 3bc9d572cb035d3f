//! `modpm uninstall` - delete installed MOD versions.

use super::common::{CommandContext, GlobalOptions};
use crate::installer::apply_uninstall_plan;
use crate::models::ModSpec;
use crate::resolver::{UninstallPlan, plan_uninstall, plan_uninstall_all};
use anyhow::Result;
use clap::Args;
use colored::Colorize;

/// Delete installed MOD versions.
///
/// `name` removes every installed version, `name@version` only that one.
/// Refuses when an enabled MOD would lose a required dependency. `--all`
/// removes every MOD from the mods directory and disables the expansions.
#[derive(Args, Debug)]
pub struct UninstallCommand {
    /// MODs to uninstall (`name` or `name@version`)
    #[arg(value_name = "SPEC", required_unless_present = "all", conflicts_with = "all")]
    specs: Vec<String>,

    /// Uninstall every MOD
    #[arg(long)]
    all: bool,

    /// Print the plan without changing anything
    #[arg(long)]
    dry_run: bool,
}

impl UninstallCommand {
    /// Run the command.
    pub async fn execute(self, options: GlobalOptions) -> Result<()> {
        let mut ctx = CommandContext::load(&options, None).await?;

        let plan = if self.all {
            plan_uninstall_all(&ctx.graph, &ctx.installed)?
        } else {
            let specs =
                self.specs.iter().map(|raw| raw.parse()).collect::<Result<Vec<ModSpec>, _>>()?;
            plan_uninstall(&ctx.graph, &ctx.installed, &ctx.mod_list, &specs)?
        };

        print_plan(&ctx, &plan);
        if self.dry_run || plan.is_empty() {
            return Ok(());
        }

        apply_uninstall_plan(&plan, &mut ctx.mod_list)?;
        let removed: usize = plan.items.iter().map(|item| item.artifacts.len()).sum();
        ctx.success(format!("Removed {removed} artifacts"));
        Ok(())
    }
}

fn print_plan(ctx: &CommandContext, plan: &UninstallPlan) {
    if plan.is_empty() {
        ctx.say("Nothing to do");
        return;
    }

    ctx.say(format!("{}", "Plan:".bold()));
    for item in &plan.items {
        if item.disable_only {
            ctx.say(format!("  {} {}", "disable".yellow(), item.id));
            continue;
        }
        for artifact in &item.artifacts {
            ctx.say(format!("  {} {}@{}", "remove".red(), item.id, artifact.version));
        }
        if let Some(pin) = item.new_pin {
            ctx.say(format!("  {} {} to {pin}", "pin".cyan(), item.id));
        }
    }
}
