//! Installation of the sudoers grant.
//!
//! The grant is staged as a dot-file next to the live path (sudo skips
//! dot-files in `sudoers.d`), checked with `visudo`, and renamed over the
//! live file only when the check passes.

use std::path::Path;

use anyhow::Result;

use crate::application::ports::{CommandRunner, HostFs};
use crate::application::services::exec::run_checked;
use crate::application::services::steps::{fail_as, read_current};
use crate::domain::config::SetupConfig;
use crate::domain::grant::{GRANT_MODE, RULE_COUNT};
use crate::domain::{PrivilegeGrant, ProvisionError, StepOutcome};

/// Ensure the live grant is exactly the rendered four-rule grant.
///
/// # Errors
///
/// Returns `ProvisionError::Validation` if the rendered grant is broader than
/// the enumerated sub-commands or `visudo` rejects it; the previously active
/// grant is left untouched in both cases.
pub async fn ensure(
    runner: &impl CommandRunner,
    fs: &impl HostFs,
    cfg: &SetupConfig,
    dry_run: bool,
) -> Result<StepOutcome> {
    let account = cfg.account.name.as_str();
    let grant = PrivilegeGrant::for_account(account, &cfg.sacli_path);
    grant.validate_scoping(account)?;
    let rendered = grant.render();

    let live = cfg.paths.sudoers_file.as_path();
    if is_installed(fs, live, rendered.as_bytes(), dry_run)? {
        return Ok(StepOutcome::AlreadySatisfied(format!(
            "{} grants {RULE_COUNT} sub-command(s) to '{account}'",
            live.display()
        )));
    }
    if dry_run {
        return Ok(StepOutcome::Planned(format!(
            "install {RULE_COUNT}-rule grant at {}",
            live.display()
        )));
    }

    if let Some(dir) = live.parent() {
        if !fs.exists(dir) {
            fs.create_dir_all(dir)
                .map_err(fail_as(ProvisionError::Filesystem))?;
        }
    }

    let staged = fs
        .stage(live, rendered.as_bytes(), GRANT_MODE)
        .map_err(fail_as(ProvisionError::Filesystem))?;
    let staged_arg = staged.to_string_lossy().into_owned();
    if let Err(e) = run_checked(runner, "visudo", &["-c", "-q", "-f", staged_arg.as_str()]).await {
        discard(fs, &staged);
        return Err(ProvisionError::Validation(format!("visudo rejected the staged grant: {e:#}")).into());
    }
    if let Err(e) = fs.rename(&staged, live) {
        discard(fs, &staged);
        return Err(fail_as(ProvisionError::Filesystem)(e));
    }

    // Read back what sudo will now load.
    let installed = fs.read(live).map_err(fail_as(ProvisionError::Filesystem))?;
    PrivilegeGrant::parse(&String::from_utf8_lossy(&installed))?.validate_scoping(account)?;

    tracing::info!(path = %live.display(), rules = RULE_COUNT, "activated privilege grant");
    Ok(StepOutcome::Created(format!(
        "installed {RULE_COUNT}-rule grant for '{account}' at {}",
        live.display()
    )))
}

/// Whether `live` already holds `rendered` with the grant mode. An
/// unreadable file counts as not installed during a dry run.
fn is_installed(fs: &impl HostFs, live: &Path, rendered: &[u8], dry_run: bool) -> Result<bool> {
    if !read_current(fs, live, dry_run)?.matches(rendered) {
        return Ok(false);
    }
    Ok(fs.mode(live).map_err(fail_as(ProvisionError::Filesystem))? == GRANT_MODE)
}

fn discard(fs: &impl HostFs, staged: &Path) {
    if let Err(e) = fs.remove_file(staged) {
        tracing::warn!(path = %staged.display(), error = %e, "failed to remove staged grant");
    }
}
