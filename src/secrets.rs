//! Shared-secret handling
//!
//! The API key is held in a [`Secret`] that redacts itself in `Debug` output,
//! zeroes its memory on drop and compares in constant time.

use constant_time_eq::constant_time_eq;
use std::env;
use tracing::trace;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::types::{ConfigError, Result};

/// Environment variable consulted for the API key when none is configured
pub const DEFAULT_API_KEY_ENV: &str = "RELOAD_HOOK_API_KEY";

/// Static shared secret compared against bearer credentials
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// True when `candidate` is non-empty and equal to the secret
    pub fn matches(&self, candidate: &str) -> bool {
        !candidate.is_empty() && constant_time_eq(self.0.as_bytes(), candidate.as_bytes())
    }

    /// Expose the secret value (use with caution)
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED {} bytes])", self.0.len())
    }
}

/// Resolve the API key: an explicit value wins, otherwise `env_var` is read
pub fn resolve(explicit: Option<&str>, env_var: &str) -> Result<Secret> {
    if let Some(value) = explicit.filter(|v| !v.is_empty()) {
        trace!("Using API key from configuration file");
        return Ok(Secret::new(value));
    }

    match env::var(env_var) {
        Ok(value) if !value.is_empty() => {
            trace!(env_var = %env_var, "Using API key from environment");
            Ok(Secret::new(value))
        }
        _ => Err(ConfigError::MissingSecret {
            env_var: env_var.to_string(),
        }
        .into()),
    }
}
