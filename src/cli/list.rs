//! `modpm list` - show installed MODs.

use super::common::{CommandContext, GlobalOptions};
use anyhow::Result;
use clap::Args;
use colored::Colorize;

/// List installed MODs with their versions and MOD list state.
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Only enabled MODs
    #[arg(long, conflicts_with = "disabled")]
    enabled: bool,

    /// Only disabled MODs
    #[arg(long)]
    disabled: bool,
}

impl ListCommand {
    /// Run the command.
    pub async fn execute(self, options: GlobalOptions) -> Result<()> {
        let ctx = CommandContext::load(&options, None).await?;

        let mut shown = 0;
        for node in ctx.graph.nodes() {
            if (self.enabled && !node.enabled) || (self.disabled && node.enabled) {
                continue;
            }
            shown += 1;

            let versions = ctx
                .installed
                .versions_of(node.id.as_str())
                .iter()
                .map(|artifact| {
                    let version = artifact.version.to_string();
                    if Some(artifact.version) == node.resolved_version {
                        version.bold().to_string()
                    } else {
                        version
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");

            let state = if node.enabled { "enabled".green() } else { "disabled".dimmed() };
            let pin = ctx
                .mod_list
                .version(node.id.as_str())
                .map(|pin| format!(" (pinned {pin})"))
                .unwrap_or_default();

            println!("{:<32} {versions} [{state}]{pin}", node.id.to_string());
        }

        if shown == 0 {
            ctx.say("No MODs found");
        }
        Ok(())
    }
}
