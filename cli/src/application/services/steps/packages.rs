//! Host package installation through dpkg/apt.

use anyhow::Result;

use crate::application::ports::CommandRunner;
use crate::application::services::exec::{RetryPolicy, run_network_command};
use crate::domain::{ProvisionError, StepOutcome};

const INSTALLED: &str = "install ok installed";

/// apt-get is run through `env` so the child sees a non-interactive frontend.
const APT_PREFIX: [&str; 2] = ["DEBIAN_FRONTEND=noninteractive", "apt-get"];

/// Ensure every package in `packages` is installed.
///
/// The package index is only refreshed when something is missing.
///
/// # Errors
///
/// Returns `ProvisionError::DependencyInstall` if dpkg cannot be queried or
/// apt fails, and `ProvisionError::Timeout` if the last apt attempt timed out.
pub async fn ensure(
    runner: &impl CommandRunner,
    packages: &[String],
    policy: &RetryPolicy,
    dry_run: bool,
) -> Result<StepOutcome> {
    let missing = missing_packages(runner, packages).await?;
    if missing.is_empty() {
        return Ok(StepOutcome::AlreadySatisfied(format!(
            "{} package(s) installed",
            packages.len()
        )));
    }

    let listed = missing.join(", ");
    if dry_run {
        return Ok(StepOutcome::Planned(format!("install {listed}")));
    }

    apt(runner, &["update"], policy).await?;
    let mut install = vec!["install", "-y", "--no-install-recommends"];
    install.extend(missing.iter().map(String::as_str));
    apt(runner, &install, policy).await?;

    tracing::info!(packages = %listed, "installed host packages");
    Ok(StepOutcome::Created(format!("installed {listed}")))
}

async fn missing_packages(runner: &impl CommandRunner, packages: &[String]) -> Result<Vec<String>> {
    let mut missing = Vec::new();
    for package in packages {
        let output = runner
            .run("dpkg-query", &["-W", "-f=${Status}", package])
            .await
            .map_err(|e| ProvisionError::DependencyInstall(format!("dpkg-query: {e:#}")))?;
        let installed = output.status.success()
            && String::from_utf8_lossy(&output.stdout).trim() == INSTALLED;
        tracing::debug!(package = %package, installed, "queried package status");
        if !installed {
            missing.push(package.clone());
        }
    }
    Ok(missing)
}

async fn apt(runner: &impl CommandRunner, args: &[&str], policy: &RetryPolicy) -> Result<()> {
    let mut full: Vec<&str> = APT_PREFIX.to_vec();
    full.extend_from_slice(args);
    run_network_command(runner, "env", &full, policy).await?;
    Ok(())
}
