use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::types::{ExecutionError, Result};

/// Maximum size for captured stdout/stderr to prevent memory issues
const MAX_OUTPUT_SIZE: usize = 10 * 1024; // 10KB per stream

/// Outcome of a command that exited successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub command: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

/// Runs a command with a timeout and a fixed working directory
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    /// Maximum time to wait for command completion
    pub timeout: Duration,
    /// Working directory for command execution
    pub working_dir: String,
}

impl CommandExecutor {
    pub fn new<P: AsRef<Path>>(timeout: Duration, working_dir: P) -> Self {
        Self {
            timeout,
            working_dir: working_dir.as_ref().to_string_lossy().to_string(),
        }
    }

    /// Execute a command, capturing output. Non-zero exits, signals and
    /// timeouts are errors; a timed out child is killed.
    pub async fn execute(&self, command: &[String]) -> Result<CommandOutput> {
        let (executable, args) = command
            .split_first()
            .ok_or(ExecutionError::EmptyCommand)?;

        debug!(
            command = ?command,
            working_dir = %self.working_dir,
            timeout_secs = self.timeout.as_secs(),
            "Executing command"
        );

        let start_time = Instant::now();

        let mut cmd = Command::new(executable);
        cmd.args(args)
            .current_dir(&self.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let execution_result = timeout(self.timeout, cmd.output()).await;
        let duration_ms = start_time.elapsed().as_millis() as u64;

        match execution_result {
            Ok(Ok(output)) => {
                let stdout = truncate_output(output.stdout);
                let stderr = truncate_output(output.stderr);

                match output.status.code() {
                    Some(0) => {
                        debug!(
                            command = ?command,
                            duration_ms = duration_ms,
                            stdout_len = stdout.len(),
                            stderr_len = stderr.len(),
                            "Command completed"
                        );
                        Ok(CommandOutput {
                            command: command.to_vec(),
                            stdout,
                            stderr,
                            duration_ms,
                        })
                    }
                    Some(code) => {
                        warn!(
                            command = ?command,
                            exit_code = code,
                            stderr = %stderr,
                            "Command failed with non-zero exit code"
                        );
                        Err(ExecutionError::NonZeroExit {
                            command: command.join(" "),
                            code,
                        }
                        .into())
                    }
                    None => {
                        warn!(command = ?command, "Command terminated by signal");
                        Err(ExecutionError::Terminated {
                            command: command.join(" "),
                        }
                        .into())
                    }
                }
            }
            Ok(Err(io_error)) => {
                error!(
                    command = ?command,
                    error = %io_error,
                    "Failed to execute command"
                );
                Err(ExecutionError::StartFailed {
                    command: command.join(" "),
                    source: io_error,
                }
                .into())
            }
            Err(_elapsed) => {
                warn!(
                    command = ?command,
                    timeout_secs = self.timeout.as_secs(),
                    duration_ms = duration_ms,
                    "Command timed out"
                );
                Err(ExecutionError::Timeout {
                    command: command.join(" "),
                    timeout: self.timeout.as_secs(),
                }
                .into())
            }
        }
    }
}

/// Truncate command output to prevent memory issues
fn truncate_output(output: Vec<u8>) -> String {
    let output_str = String::from_utf8_lossy(&output);
    if output_str.len() > MAX_OUTPUT_SIZE {
        let mut end = MAX_OUTPUT_SIZE;
        while !output_str.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... [truncated at {} bytes]",
            &output_str[..end],
            MAX_OUTPUT_SIZE
        )
    } else {
        output_str.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Error;
    use tempfile::tempdir;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_successful_command_execution() {
        let executor = CommandExecutor::new(Duration::from_secs(10), "/tmp");

        let result = executor.execute(&cmd(&["echo", "hello world"])).await.unwrap();

        assert_eq!(result.command, vec!["echo", "hello world"]);
        assert_eq!(result.stdout.trim(), "hello world");
    }

    #[tokio::test]
    async fn test_command_with_non_zero_exit() {
        let executor = CommandExecutor::new(Duration::from_secs(10), "/tmp");

        let result = executor.execute(&cmd(&["sh", "-c", "exit 3"])).await;

        match result {
            Err(Error::Execution(ExecutionError::NonZeroExit { command, code })) => {
                assert!(command.contains("sh -c exit 3"));
                assert_eq!(code, 3);
            }
            _ => panic!("Expected NonZeroExit error, got: {:?}", result),
        }
    }

    #[tokio::test]
    async fn test_command_timeout() {
        let executor = CommandExecutor::new(Duration::from_millis(100), "/tmp");

        let result = executor.execute(&cmd(&["sleep", "5"])).await;

        match result {
            Err(Error::Execution(ExecutionError::Timeout { command, timeout })) => {
                assert!(command.contains("sleep 5"));
                assert_eq!(timeout, 0); // Timeout was less than 1 second
            }
            _ => panic!("Expected Timeout error, got: {:?}", result),
        }
    }

    #[tokio::test]
    async fn test_empty_command() {
        let executor = CommandExecutor::new(Duration::from_secs(1), "/tmp");
        let result = executor.execute(&[]).await;
        assert!(matches!(
            result,
            Err(Error::Execution(ExecutionError::EmptyCommand))
        ));
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let executor = CommandExecutor::new(Duration::from_secs(1), "/tmp");
        let result = executor
            .execute(&cmd(&["/nonexistent/reload-hook-binary"]))
            .await;
        assert!(matches!(
            result,
            Err(Error::Execution(ExecutionError::StartFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_working_directory() {
        let dir = tempdir().unwrap();
        let executor = CommandExecutor::new(Duration::from_secs(10), dir.path());

        let result = executor.execute(&cmd(&["pwd"])).await.unwrap();

        let expected = dir.path().canonicalize().unwrap();
        let actual = Path::new(result.stdout.trim()).canonicalize().unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_truncate_output() {
        assert_eq!(truncate_output(b"short".to_vec()), "short");

        let long = vec![b'a'; MAX_OUTPUT_SIZE + 10];
        let truncated = truncate_output(long);
        assert!(truncated.ends_with(&format!("[truncated at {} bytes]", MAX_OUTPUT_SIZE)));
        assert!(truncated.len() < MAX_OUTPUT_SIZE + 40);
    }
}
