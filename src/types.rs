use std::net::SocketAddr;

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Failed to bind listener on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    #[error("Connection with {peer} failed: {source}")]
    Connection {
        peer: SocketAddr,
        #[source]
        source: hyper::Error,
    },

    #[error("Failed to encode response body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Application error: {0}")]
    Application(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Config file parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("The {handler} handler must be registered before the service is started")]
    MissingHandler { handler: &'static str },

    #[error("The {handler} handler is already registered")]
    HandlerAlreadySet { handler: &'static str },

    #[error("No API key configured: set security.api_key or the {env_var} environment variable")]
    MissingSecret { env_var: String },
}

/// Errors raised while running the configured reload command
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Reload command is empty")]
    EmptyCommand,

    #[error("Command '{command}' failed with exit code {code}")]
    NonZeroExit { command: String, code: i32 },

    #[error("Command '{command}' was terminated by a signal")]
    Terminated { command: String },

    #[error("Command '{command}' timed out after {timeout}s")]
    Timeout { command: String, timeout: u64 },

    #[error("Command '{command}' could not be started: {source}")]
    StartFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_conversion() {
        let error: Error = ConfigError::MissingHandler { handler: "trigger" }.into();
        assert!(matches!(
            error,
            Error::Config(ConfigError::MissingHandler { handler: "trigger" })
        ));
        assert_eq!(
            error.to_string(),
            "Configuration error: The trigger handler must be registered before the service is started"
        );
    }

    #[test]
    fn test_bind_error_message() {
        let error = Error::Bind {
            address: "127.0.0.1:80".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        };
        assert!(error.to_string().contains("127.0.0.1:80"));
        assert!(error.to_string().contains("address in use"));
    }

    #[test]
    fn test_execution_error_message() {
        let error: Error = ExecutionError::NonZeroExit {
            command: "false".to_string(),
            code: 1,
        }
        .into();
        assert_eq!(
            error.to_string(),
            "Execution error: Command 'false' failed with exit code 1"
        );
    }
}
