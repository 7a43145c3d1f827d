use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, instrument};

use reload_hook::config::SystemConfig;
use reload_hook::execution::CommandTrigger;
use reload_hook::logging;
use reload_hook::{Result, TriggerService};

#[derive(Parser)]
#[command(name = "reload-hook")]
#[command(about = "A minimal authenticated reload trigger")]
#[command(long_about = "
A single-binary HTTP service exposing POST /api/reload. Requests carrying the
configured bearer token run the configured reload command.
")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, default_value = "/etc/reload-hook/config.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Run the trigger service (default if no subcommand given)
    Run(RunArgs),
    /// Validate the configuration file
    Validate,
    /// Show version information
    Version,
}

#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    /// Override the bind host (e.g. "127.0.0.1")
    #[arg(long)]
    pub bind: Option<String>,

    /// Override the bind port
    #[arg(long)]
    pub port: Option<u16>,

    /// Set log format
    #[arg(long)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Get effective log level considering verbose/quiet flags
    pub fn effective_log_level(&self) -> LogLevel {
        if self.verbose {
            LogLevel::Debug
        } else if self.quiet {
            LogLevel::Error
        } else {
            self.log_level.clone().unwrap_or(LogLevel::Info)
        }
    }

    /// Log level override from CLI flags, if any were given
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.log_level.is_none() && !self.verbose && !self.quiet {
            return None;
        }
        Some(match self.effective_log_level() {
            LogLevel::Trace => logging::level::TRACE,
            LogLevel::Debug => logging::level::DEBUG,
            LogLevel::Info => logging::level::INFO,
            LogLevel::Warn => logging::level::WARN,
            LogLevel::Error => logging::level::ERROR,
        })
    }

    /// Get log format override from CLI arguments
    pub fn log_format_override(&self) -> Option<&'static str> {
        match &self.command {
            Some(Commands::Run(args)) => args.log_format.as_ref().map(|fmt| match fmt {
                LogFormat::Json => logging::format::JSON,
                LogFormat::Pretty => logging::format::PRETTY,
            }),
            _ => None,
        }
    }
}

impl RunArgs {
    /// Apply CLI overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut SystemConfig) {
        if let Some(host) = &self.bind {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

/// Run the trigger service until the process is interrupted
#[instrument(skip_all)]
pub async fn run_server(cli: &Cli, args: RunArgs, system_config: Option<SystemConfig>) -> Result<()> {
    let mut system_config = match system_config {
        Some(config) => config,
        None => {
            info!("Loading configuration...");
            SystemConfig::load_from_file(&cli.config)?
        }
    };
    args.apply(&mut system_config);
    system_config.validate()?;

    let secret = system_config.resolve_secret()?;

    info!(
        config_path = %cli.config.display(),
        listen = %system_config.listen_address(),
        command = ?system_config.reload.command,
        "Configuration loaded successfully"
    );

    let trigger = CommandTrigger::from_config(&system_config.reload);

    let mut service = TriggerService::new(
        system_config.server.host.clone(),
        system_config.server.port,
        secret,
    )
    .with_error_queue_capacity(system_config.errors.queue_capacity);
    service.set_trigger_handler(move || trigger.run())?;
    service.set_error_handler(|e| error!(error = %e, "Trigger service error"))?;

    let listen = system_config.listen_address();
    service.start(|| info!(listen = %listen, "Reload hook started"))?;

    // No graceful shutdown: the service lives until the process exits
    signal::ctrl_c().await?;
    info!("Interrupt received, exiting");
    Ok(())
}

/// Validate the configuration file and print a summary
pub async fn validate_config(cli: &Cli, system_config: Option<SystemConfig>) -> Result<()> {
    let system_config = match system_config {
        Some(config) => config,
        None => SystemConfig::load_from_file(&cli.config)?,
    };

    if let Err(e) = system_config.validate() {
        error!(error = %e, "Configuration is invalid");
        return Err(e);
    }
    let secret_source = match system_config.resolve_secret() {
        Ok(_) if system_config
            .security
            .api_key
            .as_deref()
            .is_some_and(|key| !key.is_empty()) =>
        {
            "configuration file".to_string()
        }
        Ok(_) => format!("${}", system_config.security.api_key_env),
        Err(e) => {
            error!(error = %e, "API key cannot be resolved");
            return Err(e);
        }
    };

    println!("Configuration is valid: {}", cli.config.display());
    println!("  listen:      {}", system_config.listen_address());
    println!("  api key:     {}", secret_source);
    println!("  command:     {}", system_config.reload.command.join(" "));
    println!("  working dir: {}", system_config.reload.working_dir);
    println!("  timeout:     {}s", system_config.reload.timeout);
    Ok(())
}

/// Print version information
pub async fn show_version() -> Result<()> {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    Ok(())
}
