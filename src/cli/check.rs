//! `modpm check` - report dependency problems.
//!
//! Runs the validator over the enabled MOD set and prints errors, warnings and
//! suggested fixes. The command fails when any error is found, so scripts can
//! use its exit status.

use super::common::{CommandContext, GlobalOptions};
use crate::resolver::{ValidationIssue, ValidationResult, validate};
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

/// Output format of `check`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Colored, human-readable lines
    #[default]
    Text,
    /// The full result as pretty-printed JSON
    Json,
}

/// Check the enabled MOD set for dependency problems.
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl CheckCommand {
    /// Run the command.
    pub async fn execute(self, options: GlobalOptions) -> Result<()> {
        let ctx = CommandContext::load(&options, None).await?;
        let result = validate(&ctx.graph, &ctx.mod_list, &ctx.installed);

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Text => print_text(&ctx, &result),
        }

        if !result.is_valid() {
            bail!("Found {} dependency errors", result.errors.len());
        }
        Ok(())
    }
}

fn print_text(ctx: &CommandContext, result: &ValidationResult) {
    let print = |symbol: colored::ColoredString, issues: &[ValidationIssue]| {
        for issue in issues {
            println!("{symbol} {}", issue.message);
        }
    };

    print("✗".red(), &result.errors);
    if !ctx.is_quiet() {
        print("⚠".yellow(), &result.warnings);
        print("→".cyan(), &result.suggestions);
    }

    if result.is_valid() {
        ctx.success(format!("{} MODs checked, no errors", ctx.graph.len()));
    }
}
