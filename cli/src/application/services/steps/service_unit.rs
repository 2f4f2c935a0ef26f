//! systemd unit registration. The unit is never started or enabled.

use std::path::Path;

use anyhow::Result;

use crate::application::ports::{CommandRunner, HostFs};
use crate::application::services::exec::run_checked;
use crate::application::services::steps::{fail_as, read_if_exists};
use crate::domain::config::SetupConfig;
use crate::domain::{ProvisionError, ServiceUnit, StepOutcome};

const UNIT_MODE: u32 = 0o644;

/// Install the rendered unit and reload systemd if it changed. A failed
/// reload puts the previous unit file back (or removes the new one).
///
/// # Errors
///
/// Returns `ProvisionError::ServiceRegistration` if the unit cannot be
/// written or `systemctl daemon-reload` fails.
pub async fn ensure(
    runner: &impl CommandRunner,
    fs: &impl HostFs,
    cfg: &SetupConfig,
    dry_run: bool,
) -> Result<StepOutcome> {
    let rendered = ServiceUnit::from_config(cfg).render();
    let path = cfg.paths.unit_file.as_path();
    let unit = format!("{}.service", cfg.unit_name());

    let current = read_if_exists(fs, path).map_err(fail_as(ProvisionError::ServiceRegistration))?;
    if current.as_deref() == Some(rendered.as_bytes()) {
        return Ok(StepOutcome::AlreadySatisfied(format!("{unit} registered")));
    }
    if dry_run {
        return Ok(StepOutcome::Planned(format!("install {unit} and reload systemd")));
    }

    if let Some(dir) = path.parent() {
        if !fs.exists(dir) {
            fs.create_dir_all(dir)
                .map_err(fail_as(ProvisionError::ServiceRegistration))?;
        }
    }
    fs.write_atomic(path, rendered.as_bytes(), UNIT_MODE)
        .map_err(fail_as(ProvisionError::ServiceRegistration))?;
    if let Err(e) = run_checked(runner, "systemctl", &["daemon-reload"]).await {
        // The unit on disk must stay what systemd last loaded.
        restore(fs, path, current.as_deref());
        return Err(fail_as(ProvisionError::ServiceRegistration)(e));
    }

    tracing::info!(unit = %unit, "registered service unit");
    Ok(StepOutcome::Created(format!("registered {unit} (not started)")))
}

fn restore(fs: &impl HostFs, path: &Path, previous: Option<&[u8]>) {
    let result = match previous {
        Some(bytes) => fs.write_atomic(path, bytes, UNIT_MODE),
        None => fs.remove_file(path),
    };
    if let Err(e) = result {
        tracing::warn!(path = %path.display(), error = %e, "failed to roll back unit file");
    }
}
