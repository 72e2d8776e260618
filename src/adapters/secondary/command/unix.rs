/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Unix command execution adapter

use crate::domain::{CommandError, SystemError};
use crate::ports::{CommandExecutor, CommandOutput, SystemCommand};
use async_trait::async_trait;
use log::{debug, trace};
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Unix-based command executor with optional timeouts and retries
pub struct UnixCommandExecutor {
    /// Timeout for commands that do not set one; none waits for completion
    default_timeout: Option<Duration>,
    /// Number of retry attempts for commands that could not run
    retry_count: u32,
}

impl UnixCommandExecutor {
    /// Create a new Unix command executor
    ///
    /// # Arguments
    /// * `default_timeout` - Timeout for commands that do not set one
    /// * `retry_count` - Number of retry attempts
    pub fn new(default_timeout: Option<Duration>, retry_count: u32) -> Self {
        Self {
            default_timeout,
            retry_count,
        }
    }

    /// Create a Unix command executor that waits for every command
    pub fn with_defaults() -> Self {
        Self::new(None, 0)
    }

    /// Execute a command with optional retry logic
    ///
    /// Only spawn failures and timeouts are retried; a command that ran and
    /// exited non-zero is returned as is.
    async fn execute_with_retry(
        &self,
        command: &SystemCommand,
    ) -> Result<CommandOutput, CommandError> {
        let mut attempt = 0;

        loop {
            match self.execute_once(command).await {
                Ok(output) => return Ok(output),
                Err(e) if attempt < self.retry_count => {
                    attempt += 1;
                    debug!("{command}: {e}, retrying (attempt {attempt})");
                    tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Execute a command once
    async fn execute_once(&self, command: &SystemCommand) -> Result<CommandOutput, CommandError> {
        let command_timeout = command.timeout.or(self.default_timeout);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        for (key, value) in &command.env_vars {
            cmd.env(key, value);
        }

        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        trace!("Executing: {command}");

        let result = match command_timeout {
            Some(limit) => timeout(limit, cmd.output()).await.map_err(|_| {
                SystemError::Timeout(format!(
                    "Command '{}' timed out after {limit:?}",
                    command.program
                ))
            })?,
            None => cmd.output().await,
        };

        match result {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                let success = output.status.success();
                let exit_code = output.status.code();

                if !success {
                    trace!("{command} exited with {exit_code:?}: {}", stderr.trim());
                }

                Ok(CommandOutput {
                    stdout,
                    stderr,
                    exit_code,
                    success,
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SystemError::CommandNotFound(command.program.clone()).into())
            }
            Err(e) => Err(CommandError::ExecutionFailed(format!(
                "Failed to execute command '{}': {}",
                command.program, e
            ))),
        }
    }
}

impl Default for UnixCommandExecutor {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl CommandExecutor for UnixCommandExecutor {
    async fn execute(&self, command: &SystemCommand) -> Result<CommandOutput, CommandError> {
        self.execute_with_retry(command).await
    }

    async fn is_command_available(&self, command_name: &str) -> Result<bool, CommandError> {
        let which_cmd = SystemCommand::new("which").args(&[command_name]);

        match self.execute(&which_cmd).await {
            Ok(output) => Ok(output.success && !output.stdout.trim().is_empty()),
            // If 'which' itself is missing, assume the command is too
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unix_command_executor_basic() {
        let executor = UnixCommandExecutor::with_defaults();

        let cmd = SystemCommand::new("echo").args(&["hello", "world"]);

        let result = executor.execute(&cmd).await.unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "hello world");
    }

    #[tokio::test]
    async fn test_environment_is_passed() {
        let executor = UnixCommandExecutor::with_defaults();

        let cmd = SystemCommand::new("sh")
            .args(&["-c", "echo $HARDWARE_DETECT_TEST_VAR"])
            .env("HARDWARE_DETECT_TEST_VAR", "1");

        let result = executor.execute(&cmd).await.unwrap();
        assert_eq!(result.stdout.trim(), "1");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_not_an_error() {
        let executor = UnixCommandExecutor::with_defaults();

        let result = executor.execute(&SystemCommand::new("false")).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let executor = UnixCommandExecutor::with_defaults();

        let cmd = SystemCommand::new("definitely_not_a_real_command_12345");
        let err = executor.execute(&cmd).await.unwrap_err();
        assert!(matches!(
            err,
            CommandError::System(SystemError::CommandNotFound(_))
        ));

        assert!(!executor
            .is_command_available("definitely_not_a_real_command_12345")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_command_timeout() {
        let executor = UnixCommandExecutor::with_defaults();

        let cmd = SystemCommand::new("sleep")
            .args(&["10"])
            .timeout(Duration::from_millis(100));

        let result = executor.execute(&cmd).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_no_default_timeout() {
        let executor = UnixCommandExecutor::with_defaults();
        assert_eq!(executor.default_timeout, None);

        let cmd = SystemCommand::new("sleep").args(&["1"]);
        let result = executor.execute(&cmd).await.unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_configured_default_timeout() {
        let executor = UnixCommandExecutor::new(Some(Duration::from_millis(100)), 0);

        let cmd = SystemCommand::new("sleep").args(&["10"]);
        let err = executor.execute(&cmd).await.unwrap_err();
        assert!(matches!(err, CommandError::System(SystemError::Timeout(_))));
    }
}
