//! Service account provisioning.

use anyhow::Result;

use crate::application::ports::{CommandRunner, HostIdentity};
use crate::application::services::exec::run_checked;
use crate::domain::config::AccountConfig;
use crate::domain::{ProvisionError, StepOutcome};

/// Ensure the system account exists. An existing account is never modified.
///
/// # Errors
///
/// Returns `ProvisionError::Account` if the lookup or `useradd` fails, or if
/// the account is still missing afterwards.
pub async fn ensure(
    runner: &impl CommandRunner,
    identity: &impl HostIdentity,
    account: &AccountConfig,
    dry_run: bool,
) -> Result<StepOutcome> {
    let name = account.name.as_str();
    let fail = |reason: String| -> anyhow::Error {
        ProvisionError::Account {
            account: name.to_string(),
            reason,
        }
        .into()
    };

    if let Some(existing) = identity
        .lookup_account(name)
        .map_err(|e| fail(format!("lookup failed: {e:#}")))?
    {
        return Ok(StepOutcome::AlreadySatisfied(format!(
            "account '{name}' exists (uid {})",
            existing.uid
        )));
    }

    if dry_run {
        return Ok(StepOutcome::Planned(format!("create system account '{name}'")));
    }

    let home = account.home.to_string_lossy();
    let shell = account.shell.to_string_lossy();
    run_checked(
        runner,
        "useradd",
        &[
            "--system",
            "--user-group",
            "--home-dir",
            &home,
            "--create-home",
            "--shell",
            &shell,
            name,
        ],
    )
    .await
    .map_err(|e| fail(format!("{e:#}")))?;

    let created = identity
        .lookup_account(name)
        .map_err(|e| fail(format!("lookup failed: {e:#}")))?
        .ok_or_else(|| fail("not found after useradd".to_string()))?;
    tracing::info!(account = name, uid = created.uid, "created service account");
    Ok(StepOutcome::Created(format!(
        "created system account '{name}' (uid {})",
        created.uid
    )))
}
