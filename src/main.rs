mod cli;

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Commands, RunArgs};
use reload_hook::config::SystemConfig;
use reload_hook::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Try to load config for logging setup, but don't fail if it doesn't exist
    let system_config = match &cli.command {
        Some(Commands::Version) => None,
        _ => SystemConfig::load_from_file(&cli.config).ok(),
    };

    reload_hook::logging::init(
        cli.log_level_override(),
        cli.log_format_override(),
        system_config.as_ref(),
    )?;

    info!("Starting reload-hook");

    match cli.command.clone().unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => cli::run_server(&cli, args, system_config).await,
        Commands::Validate => cli::validate_config(&cli, system_config).await,
        Commands::Version => cli::show_version().await,
    }
}
