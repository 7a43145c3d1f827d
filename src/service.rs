//! Trigger service lifecycle
//!
//! A [`TriggerService`] is built from a bind address and a shared secret,
//! given its two handlers, and then started. Starting spawns the error
//! consumer and the HTTP listener and returns immediately; it never reports
//! whether the listener managed to bind. That, and every later failure,
//! arrives at the error handler instead.
//!
//! ```rust,no_run
//! use reload_hook::TriggerService;
//!
//! # async fn run() -> reload_hook::Result<()> {
//! let mut service = TriggerService::new("127.0.0.1", 8080, "s3cr3t");
//! service.set_trigger_handler(|| Ok(()))?;
//! service.set_error_handler(|error| eprintln!("reload-hook: {}", error))?;
//! service.start(|| println!("started"))?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{info, instrument, warn};

use crate::{
    http::{self, auth::BearerAuth, handlers::AppState},
    pipeline::{self, ErrorHandler, DEFAULT_QUEUE_CAPACITY},
    secrets::Secret,
    types::{ConfigError, Error, Result},
};

/// Reload action registered by the embedder
pub type TriggerHandler = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync + 'static>;

/// Authenticated single-endpoint trigger service
pub struct TriggerService {
    host: String,
    port: u16,
    secret: Secret,
    error_queue_capacity: usize,
    trigger: Option<TriggerHandler>,
    error_handler: Option<ErrorHandler>,
}

impl TriggerService {
    /// Create a service; performs no I/O
    pub fn new(host: impl Into<String>, port: u16, secret: impl Into<Secret>) -> Self {
        Self {
            host: host.into(),
            port,
            secret: secret.into(),
            error_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            trigger: None,
            error_handler: None,
        }
    }

    /// Number of errors that may wait for the error handler before new ones
    /// are dropped
    pub fn with_error_queue_capacity(mut self, capacity: usize) -> Self {
        self.error_queue_capacity = capacity.max(1);
        self
    }

    /// Register the action run for each authenticated request
    pub fn set_trigger_handler<F>(&mut self, handler: F) -> Result<()>
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        if self.trigger.is_some() {
            return Err(ConfigError::HandlerAlreadySet { handler: "trigger" }.into());
        }
        self.trigger = Some(Arc::new(handler));
        Ok(())
    }

    /// Register the sink for operational errors
    pub fn set_error_handler<F>(&mut self, handler: F) -> Result<()>
    where
        F: FnMut(Error) + Send + 'static,
    {
        if self.error_handler.is_some() {
            return Err(ConfigError::HandlerAlreadySet { handler: "error" }.into());
        }
        self.error_handler = Some(Box::new(handler));
        Ok(())
    }

    /// Address the listener binds to, as `host:port`
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Start serving and then run `then` on the caller's thread.
    ///
    /// Fails only if a handler is missing, no Tokio runtime is available, or
    /// the error consumer thread cannot be spawned. Must be called from
    /// within a Tokio runtime.
    #[instrument(skip_all, fields(address = %self.listen_address()))]
    pub fn start<F>(self, then: F) -> Result<()>
    where
        F: FnOnce(),
    {
        let address = self.listen_address();
        let trigger = self
            .trigger
            .ok_or(ConfigError::MissingHandler { handler: "trigger" })?;
        let error_handler = self
            .error_handler
            .ok_or(ConfigError::MissingHandler { handler: "error" })?;
        let runtime = Handle::try_current().map_err(|e| {
            Error::Application(format!(
                "Trigger service must be started inside a Tokio runtime: {}",
                e
            ))
        })?;

        if self.secret.is_empty() {
            warn!("Shared secret is empty, every request will be rejected");
        }

        let (errors, consumer) = pipeline::channel(self.error_queue_capacity);
        consumer.spawn(error_handler)?;

        let app_state = Arc::new(AppState {
            auth: BearerAuth::new(self.secret),
            trigger,
            errors: errors.clone(),
        });
        let router = http::create_router(app_state);

        info!(
            error_queue_capacity = self.error_queue_capacity,
            "Starting trigger service"
        );
        runtime.spawn(http::serve(address, router, errors));

        then();
        Ok(())
    }
}

impl std::fmt::Debug for TriggerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerService")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secret", &self.secret)
            .field("error_queue_capacity", &self.error_queue_capacity)
            .field("trigger", &self.trigger.is_some())
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}
