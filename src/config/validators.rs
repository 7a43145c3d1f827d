use std::net::IpAddr;

use super::types::SystemConfig;
use crate::logging;
use crate::types::{Error, Result};

/// Largest error queue the service accepts
pub(crate) const MAX_QUEUE_CAPACITY: usize = 65536;

const LOG_LEVELS: &[&str] = &[
    logging::level::TRACE,
    logging::level::DEBUG,
    logging::level::INFO,
    logging::level::WARN,
    logging::level::ERROR,
];

const LOG_FORMATS: &[&str] = &[logging::format::JSON, logging::format::PRETTY];

fn invalid(field: &str, message: impl Into<String>) -> Error {
    Error::Validation {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate the bind host: an IP address or a plausible hostname
pub(crate) fn validate_host(host: &str) -> Result<()> {
    if host.is_empty() {
        return Err(invalid("server.host", "Host cannot be empty"));
    }
    if host.parse::<IpAddr>().is_ok() {
        return Ok(());
    }
    let valid_hostname = host
        .split('.')
        .all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                && !label.starts_with('-')
                && !label.ends_with('-')
        });
    if !valid_hostname {
        return Err(invalid(
            "server.host",
            format!("Invalid host '{}'. Expected an IP address or hostname", host),
        ));
    }
    Ok(())
}

/// Validate the bind port
pub(crate) fn validate_port(port: u16) -> Result<()> {
    if port == 0 {
        return Err(invalid("server.port", "Port must be greater than 0"));
    }
    Ok(())
}

/// Validate the reload command
pub(crate) fn validate_command(command: &[String]) -> Result<()> {
    match command.first() {
        None => Err(invalid("reload.command", "Command cannot be empty")),
        Some(program) if program.trim().is_empty() => Err(invalid(
            "reload.command",
            "Command executable cannot be blank",
        )),
        Some(_) => Ok(()),
    }
}

/// Validate positive timeout value
pub(crate) fn validate_positive_timeout(value: u64, field: &str) -> Result<()> {
    if value == 0 {
        return Err(invalid(field, "Timeout must be greater than 0"));
    }
    Ok(())
}

/// Validate the error queue capacity
pub(crate) fn validate_queue_capacity(value: usize) -> Result<()> {
    if value == 0 || value > MAX_QUEUE_CAPACITY {
        return Err(invalid(
            "errors.queue_capacity",
            format!(
                "Value {} is outside the allowed range 1..={}",
                value, MAX_QUEUE_CAPACITY
            ),
        ));
    }
    Ok(())
}

/// Validate a value against a list of known names
pub(crate) fn validate_one_of(value: &str, allowed: &[&str], field: &str) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(invalid(
            field,
            format!("Unknown value '{}'. Expected one of: {}", value, allowed.join(", ")),
        ));
    }
    Ok(())
}

impl SystemConfig {
    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        validate_host(&self.server.host)?;
        validate_port(self.server.port)?;
        validate_command(&self.reload.command)?;
        validate_positive_timeout(self.reload.timeout, "reload.timeout")?;
        validate_queue_capacity(self.errors.queue_capacity)?;
        validate_one_of(&self.logging.level, LOG_LEVELS, "logging.level")?;
        validate_one_of(&self.logging.format, LOG_FORMATS, "logging.format")?;

        if self.security.api_key_env.is_empty() && self.security.api_key.is_none() {
            return Err(invalid(
                "security.api_key_env",
                "Either security.api_key or security.api_key_env must be set",
            ));
        }

        Ok(())
    }
}
