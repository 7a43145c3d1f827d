//! Minimal authenticated reload trigger
//!
//! Exposes `POST /api/reload`. A request carrying `Authorization: Bearer
//! <secret>` runs the embedder's reload action; the outcome is reported in
//! the HTTP status. Operational errors (bind failures, connection failures)
//! are handed to the embedder's error handler through a lossy, non-blocking
//! pipeline.
//!
//! See [`TriggerService`] for the entry point.

pub mod config;
pub mod execution;
pub mod http;
pub mod logging;
pub mod pipeline;
pub mod secrets;
pub mod service;
pub mod types;

pub use pipeline::{ErrorConsumer, ErrorReporter};
pub use secrets::Secret;
pub use service::{TriggerHandler, TriggerService};
pub use types::{ConfigError, Error, ExecutionError, Result};
