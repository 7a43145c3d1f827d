//! Logging setup for reload-hook
//!
//! Structured logging through `tracing`, with JSON or pretty output and a
//! level taken from the CLI, the configuration file or `RUST_LOG`.

use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

use crate::config::SystemConfig;
use crate::types::{Error, Result};

/// Log level enum values as strings for configuration
pub mod level {
    pub const TRACE: &str = "trace";
    pub const DEBUG: &str = "debug";
    pub const INFO: &str = "info";
    pub const WARN: &str = "warn";
    pub const ERROR: &str = "error";
}

/// Log format enum values as strings for configuration
pub mod format {
    pub const JSON: &str = "json";
    pub const PRETTY: &str = "pretty";
}

/// Pick the effective level and format.
///
/// Precedence: CLI arguments, then the configuration file, then defaults.
pub fn effective_settings<'a>(
    log_level_override: Option<&'a str>,
    log_format_override: Option<&'a str>,
    system_config: Option<&'a SystemConfig>,
) -> (&'a str, &'a str) {
    let log_level = log_level_override
        .or_else(|| system_config.map(|c| c.logging.level.as_str()))
        .unwrap_or(level::INFO);
    let log_format = log_format_override
        .or_else(|| system_config.map(|c| c.logging.format.as_str()))
        .unwrap_or(format::PRETTY);
    (log_level, log_format)
}

/// Install the global tracing subscriber
pub fn init(
    log_level_override: Option<&str>,
    log_format_override: Option<&str>,
    system_config: Option<&SystemConfig>,
) -> Result<()> {
    let (log_level, log_format) =
        effective_settings(log_level_override, log_format_override, system_config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let timer = ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string());

    let installed = match log_format {
        format::JSON => tracing_subscriber::fmt()
            .json()
            .with_timer(timer)
            .with_env_filter(env_filter)
            .with_target(false)
            .with_current_span(true)
            .with_span_list(false)
            .try_init(),
        format::PRETTY => tracing_subscriber::fmt()
            .pretty()
            .with_timer(timer)
            .with_env_filter(env_filter)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .with_timer(timer)
            .with_env_filter(env_filter)
            .with_target(false)
            .try_init(),
    };

    installed.map_err(|e| Error::Application(format!("Failed to initialize logging: {}", e)))
}
