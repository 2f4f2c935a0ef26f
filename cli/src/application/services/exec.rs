//! Checked command execution and bounded retry for network-bound commands.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::cell::Cell;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use backoff::ExponentialBackoffBuilder;

use crate::application::ports::CommandRunner;
use crate::domain::config::NetworkConfig;
use crate::domain::{CommandFailed, CommandTimeout, ProvisionError};

/// Turn a non-zero exit into a `CommandFailed` error.
///
/// # Errors
///
/// Returns `CommandFailed` with the trimmed stderr when `output` failed.
pub fn ensure_success(program: &str, output: &Output) -> Result<(), CommandFailed> {
    if output.status.success() {
        return Ok(());
    }
    Err(CommandFailed {
        program: program.to_string(),
        code: output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |c| format!("status {c}")),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Run a program with the runner's default timeout and require success.
///
/// # Errors
///
/// Returns an error if the program cannot be spawned, times out, or exits
/// non-zero.
pub async fn run_checked(
    runner: &impl CommandRunner,
    program: &str,
    args: &[&str],
) -> Result<Output> {
    let output = runner.run(program, args).await?;
    ensure_success(program, &output)?;
    Ok(output)
}

/// Timeout and retry budget for one network-bound command.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(cfg: &NetworkConfig) -> Self {
        Self {
            timeout: Duration::from_secs(cfg.command_timeout_secs),
            max_attempts: cfg.max_attempts.max(1),
            initial_backoff: Duration::from_millis(cfg.initial_backoff_ms),
        }
    }

    fn backoff(&self) -> backoff::ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_multiplier(2.0)
            .with_randomization_factor(0.1)
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Run a network-bound command under `policy`.
///
/// Non-zero exits and timeouts are retried with exponential backoff until
/// `max_attempts` is used up; a program that cannot be spawned is not
/// retried.
///
/// # Errors
///
/// Returns `ProvisionError::Timeout` when the last attempt timed out and
/// `ProvisionError::DependencyInstall` for every other failure.
pub async fn run_network_command(
    runner: &impl CommandRunner,
    program: &str,
    args: &[&str],
    policy: &RetryPolicy,
) -> Result<Output> {
    let attempts = Cell::new(0u32);
    let timed_out = Cell::new(false);
    let (attempts_ref, timed_out_ref) = (&attempts, &timed_out);
    let max_attempts = policy.max_attempts;
    let timeout = policy.timeout;

    let result = backoff::future::retry(policy.backoff(), move || async move {
        let attempt = attempts_ref.get() + 1;
        attempts_ref.set(attempt);
        tracing::debug!(program, attempt, "running network command");

        let err: anyhow::Error = match runner.run_with_timeout(program, args, timeout).await {
            Ok(output) => match ensure_success(program, &output) {
                Ok(()) => return Ok(output),
                Err(failed) => {
                    timed_out_ref.set(false);
                    failed.into()
                }
            },
            Err(e) if e.is::<CommandTimeout>() => {
                timed_out_ref.set(true);
                e
            }
            Err(e) => {
                timed_out_ref.set(false);
                return Err(backoff::Error::permanent(e));
            }
        };

        if attempt >= max_attempts {
            return Err(backoff::Error::permanent(err));
        }
        tracing::warn!(program, attempt, max_attempts, error = %err, "retrying after failure");
        Err(backoff::Error::transient(err))
    })
    .await;

    result.map_err(|e| {
        let what = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        if timed_out.get() {
            ProvisionError::Timeout {
                what,
                after: timeout,
                attempts: attempts.get(),
            }
            .into()
        } else {
            ProvisionError::DependencyInstall(format!("{what}: {e:#}")).into()
        }
    })
}
