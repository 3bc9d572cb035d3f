//! modpm CLI entry point
//!
//! Parses the command line, installs the log subscriber, runs the command and
//! turns a failure into a colored message with suggestions and exit status 1.

use clap::Parser;
use modpm::cli::Cli;
use modpm::core::user_friendly_error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(e) = cli.execute().await {
        user_friendly_error(e).display();
        std::process::exit(1);
    }
}
