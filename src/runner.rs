//! Command execution after a successful pull

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

/// Capability to run the configured command to completion
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command`, failing when it cannot be started or exits unsuccessfully
    async fn run(&self, command: &str) -> Result<()>;
}

/// Runs commands through the platform shell so that arguments, pipes and
/// redirections in the configured command string behave as typed
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCommandRunner;

impl ShellCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> AsyncCommand {
    let mut cmd = AsyncCommand::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(not(unix))]
fn shell_command(command: &str) -> AsyncCommand {
    let mut cmd = AsyncCommand::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, command: &str) -> Result<()> {
        debug!("Executing: {}", command);

        let output = shell_command(command)
            .output()
            .await
            .with_context(|| format!("Failed to start command '{}'", command))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("Command output:\n{}", stdout.trim_end());
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "signal".to_string());
            bail!(
                "Command '{}' exited with status {}: {}",
                command,
                code,
                stderr.trim()
            );
        }

        Ok(())
    }
}
