//! Runs host tools (apt-get, useradd, openssl, visudo, ...) as child processes.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::Command;

use crate::application::ports::CommandRunner;
use crate::domain::CommandTimeout;

/// Limit for local tools; apt and pip get theirs from the network settings.
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(60);

/// `CommandRunner` backed by `tokio::process`.
///
/// Children run with a null stdin and the C locale so their output parses
/// the same on every host. A child still running at its deadline is killed.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn command(program: &str, args: &[&str]) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        let child = Self::command(program, args)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;
        tracing::debug!(program, ?args, pid = child.id(), "spawned");

        // Dropping the wait future drops the child, which kills it.
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => {
                let output = output.with_context(|| format!("waiting for {program}"))?;
                tracing::debug!(program, status = %output.status, "exited");
                Ok(output)
            }
            Err(_) => {
                tracing::warn!(program, timeout_secs = timeout.as_secs(), "killed after timeout");
                Err(CommandTimeout {
                    program: program.to_string(),
                    after: timeout,
                }
                .into())
            }
        }
    }
}
