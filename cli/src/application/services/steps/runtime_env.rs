//! Isolated Python environment for the agent, keyed by the manifest hash.

use anyhow::Result;

use crate::application::ports::{CommandRunner, HostFs};
use crate::application::services::exec::{RetryPolicy, run_checked, run_network_command};
use crate::application::services::steps::{fail_as, read_if_exists};
use crate::domain::config::SetupConfig;
use crate::domain::state::sha256_hex;
use crate::domain::{ProvisionError, ProvisionState, StepOutcome};

/// Ensure `<app_root>/venv` holds exactly the deployed manifest.
///
/// An environment built from a different manifest is cleared and rebuilt.
/// The manifest hash is recorded only after a successful install.
///
/// # Errors
///
/// Returns `ProvisionError::DependencyInstall` if the venv cannot be created
/// or pip fails, and `ProvisionError::Timeout` if the last pip attempt timed
/// out.
pub async fn ensure(
    runner: &impl CommandRunner,
    fs: &impl HostFs,
    cfg: &SetupConfig,
    state: &mut ProvisionState,
    policy: &RetryPolicy,
    dry_run: bool,
) -> Result<StepOutcome> {
    let manifest_path = cfg.deployed_manifest();
    let venv = cfg.venv_dir();
    let Some(manifest) =
        read_if_exists(fs, &manifest_path).map_err(fail_as(ProvisionError::Filesystem))?
    else {
        if dry_run {
            return Ok(StepOutcome::Planned(format!(
                "create {} and install dependencies",
                venv.display()
            )));
        }
        return Err(ProvisionError::Filesystem(format!(
            "manifest {} is not deployed",
            manifest_path.display()
        ))
        .into());
    };

    let manifest_sha = sha256_hex(&manifest);
    let has_python = fs.exists(&cfg.venv_python());
    if has_python && state.runtime_matches(&manifest_sha) {
        return Ok(StepOutcome::AlreadySatisfied(format!(
            "{} matches manifest {}",
            venv.display(),
            short(&manifest_sha)
        )));
    }

    let (action, done) = if has_python {
        ("rebuild", "rebuilt")
    } else {
        ("create", "created")
    };
    if dry_run {
        return Ok(StepOutcome::Planned(format!(
            "{action} {} and install dependencies",
            venv.display()
        )));
    }

    let venv_arg = venv.to_string_lossy().into_owned();
    let mut venv_args = vec!["-m", "venv"];
    if has_python {
        venv_args.push("--clear");
    }
    venv_args.push(&venv_arg);
    run_checked(runner, "python3", &venv_args)
        .await
        .map_err(fail_as(ProvisionError::DependencyInstall))?;

    let pip = cfg.venv_pip();
    let manifest_arg = manifest_path.to_string_lossy();
    run_network_command(
        runner,
        &pip.to_string_lossy(),
        &[
            "install",
            "--disable-pip-version-check",
            "--requirement",
            &manifest_arg,
        ],
        policy,
    )
    .await?;

    state.runtime_manifest_sha256 = Some(manifest_sha.clone());
    tracing::info!(venv = %venv.display(), manifest = %manifest_sha, "built runtime environment");
    Ok(StepOutcome::Created(format!(
        "{done} {} from manifest {}",
        venv.display(),
        short(&manifest_sha)
    )))
}

fn short(sha: &str) -> &str {
    sha.get(..12).unwrap_or(sha)
}
