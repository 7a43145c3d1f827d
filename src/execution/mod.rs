//! Command-based reload action
//!
//! The binary's trigger handler runs a configured command through
//! [`CommandExecutor`]. The trigger handler is synchronous and runs on the
//! blocking pool, so it drives the async executor with the runtime handle
//! captured at construction.

mod executor;

pub use executor::{CommandExecutor, CommandOutput};

use std::time::Duration;
use tokio::runtime::Handle;
use tracing::info;

use crate::config::ReloadConfig;

/// Reload action that runs one command
#[derive(Debug, Clone)]
pub struct CommandTrigger {
    command: Vec<String>,
    executor: CommandExecutor,
    runtime: Handle,
}

impl CommandTrigger {
    pub fn new(command: Vec<String>, executor: CommandExecutor, runtime: Handle) -> Self {
        Self {
            command,
            executor,
            runtime,
        }
    }

    /// Build from the `[reload]` section, using the current runtime
    pub fn from_config(config: &ReloadConfig) -> Self {
        let executor = CommandExecutor::new(
            Duration::from_secs(config.timeout),
            &config.working_dir,
        );
        Self::new(config.command.clone(), executor, Handle::current())
    }

    /// Run the command to completion. Must not be called from async code.
    pub fn run(&self) -> anyhow::Result<()> {
        let output = self
            .runtime
            .block_on(self.executor.execute(&self.command))?;
        info!(
            command = ?output.command,
            duration_ms = output.duration_ms,
            "Reload command completed"
        );
        Ok(())
    }
}
