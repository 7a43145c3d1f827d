use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::pipeline::DEFAULT_QUEUE_CAPACITY;
use crate::secrets::{self, Secret, DEFAULT_API_KEY_ENV};
use crate::types::{ConfigError, Result};

/// System configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    pub reload: ReloadConfig,
    #[serde(default)]
    pub errors: ErrorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadConfig {
    pub command: Vec<String>,
    #[serde(default = "default_working_dir")]
    pub working_dir: String,
    #[serde(default = "default_reload_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorsConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl SystemConfig {
    /// Load system configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let content = std::fs::read_to_string(&path)
            .map_err(|_| ConfigError::FileNotFound { path: path_str })?;

        let config: SystemConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Resolve the shared secret from the config file or the environment
    pub fn resolve_secret(&self) -> Result<Secret> {
        secrets::resolve(
            self.security.api_key.as_deref(),
            &self.security.api_key_env,
        )
    }

    /// Address the service binds to, as `host:port`
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_key_env", &self.api_key_env)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_working_dir() -> String {
    ".".to_string()
}

fn default_reload_timeout() -> u64 {
    60
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_log_level() -> String {
    crate::logging::level::INFO.to_string()
}

fn default_log_format() -> String {
    crate::logging::format::PRETTY.to_string()
}
