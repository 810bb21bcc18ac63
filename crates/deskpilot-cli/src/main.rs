//! deskpilot command line
//!
//! Usage:
//!   deskpilot run plan.json                  # validate and execute a plan
//!   deskpilot run plan.json --dry-run        # validate only
//!   deskpilot introspect -w Settings --open ms-settings:display
//!   deskpilot navigate -g "turn on bluetooth" -w Settings --open ms-settings:bluetooth
//!   deskpilot actions                        # list built-in actions

use crate::cli::{Cli, Commands};
use clap::Parser;
use colored::Colorize;

mod cli;
mod commands;
mod logging;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = logging::init_logging(cli.verbose, cli.log_dir.as_deref());

    let result = match commands::load_config(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Run(args) => commands::run_plan(args, config).await,
            Commands::Introspect(args) => commands::introspect(args, config).await,
            Commands::Navigate(args) => commands::navigate(args, config).await,
            Commands::Actions => commands::list_actions(config),
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
