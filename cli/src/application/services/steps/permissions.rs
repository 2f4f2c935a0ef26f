//! Ownership of both roots and narrowing of secret file modes.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::{CommandRunner, HostFs, HostIdentity};
use crate::application::services::exec::run_checked;
use crate::application::services::steps::fail_as;
use crate::domain::config::SetupConfig;
use crate::domain::{ProvisionError, StepOutcome};

const SECRET_MODE: u32 = 0o600;
const GROUP_OTHER_BITS: u32 = 0o077;

/// Hand both roots to the service account and narrow `.env`, `key.pem` and
/// `cert.pem` to `0600`.
///
/// `chown -R` always runs so files added under the roots are covered; the
/// outcome reflects whether the roots and secrets needed a change.
///
/// # Errors
///
/// Returns `ProvisionError::Permission` if the account is missing, a command
/// fails, or a group/other bit survives on the key or configuration file.
pub async fn ensure(
    runner: &impl CommandRunner,
    fs: &impl HostFs,
    identity: &impl HostIdentity,
    cfg: &SetupConfig,
    dry_run: bool,
) -> Result<StepOutcome> {
    let name = cfg.account.name.as_str();
    let roots = [&cfg.paths.app_root, &cfg.paths.config_root];
    let secrets = [cfg.env_file(), cfg.key_file(), cfg.cert_file()];

    let account = identity
        .lookup_account(name)
        .map_err(fail_as(ProvisionError::Permission))?;
    let Some(account) = account else {
        if dry_run {
            return Ok(StepOutcome::Planned(format!(
                "chown both roots to '{name}' and narrow secrets to 0600"
            )));
        }
        return Err(ProvisionError::Permission(format!("account '{name}' does not exist")).into());
    };

    let owned = |path: &PathBuf| fs.exists(path) && fs.owner(path).is_ok_and(|uid| uid == account.uid);
    let narrowed = |path: &PathBuf| owned(path) && fs.mode(path).is_ok_and(|m| m == SECRET_MODE);
    let satisfied = roots.into_iter().all(owned) && secrets.iter().all(narrowed);

    if dry_run {
        return Ok(if satisfied {
            StepOutcome::AlreadySatisfied(format!("owned by '{name}'; secrets are 0600"))
        } else {
            StepOutcome::Planned(format!(
                "chown both roots to '{name}' and narrow secrets to 0600"
            ))
        });
    }

    let owner = format!("{name}:{name}");
    let app_root = cfg.paths.app_root.to_string_lossy().into_owned();
    let config_root = cfg.paths.config_root.to_string_lossy().into_owned();
    run_checked(
        runner,
        "chown",
        &["-R", owner.as_str(), app_root.as_str(), config_root.as_str()],
    )
    .await
    .map_err(fail_as(ProvisionError::Permission))?;

    for path in &secrets {
        if fs.exists(path) {
            fs.set_mode(path, SECRET_MODE)
                .map_err(fail_as(ProvisionError::Permission))?;
        }
    }

    for path in [cfg.key_file(), cfg.env_file()] {
        if !fs.exists(&path) {
            return Err(ProvisionError::Permission(format!("{} is missing", path.display())).into());
        }
        let mode = fs.mode(&path).map_err(fail_as(ProvisionError::Permission))?;
        if mode & GROUP_OTHER_BITS != 0 {
            return Err(ProvisionError::Permission(format!(
                "{} is still {mode:04o} after narrowing",
                path.display()
            ))
            .into());
        }
    }

    if satisfied {
        return Ok(StepOutcome::AlreadySatisfied(format!(
            "owned by '{name}'; secrets are 0600"
        )));
    }
    tracing::info!(account = name, "enforced ownership and secret modes");
    Ok(StepOutcome::Created(format!(
        "chowned both roots to '{name}'; secrets narrowed to 0600"
    )))
}
