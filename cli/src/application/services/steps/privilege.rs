//! Privilege gate: only root may provision.

use anyhow::Result;

use crate::application::ports::HostIdentity;
use crate::domain::{ProvisionError, StepOutcome};

/// Refuse to continue unless the effective uid is 0.
///
/// A dry run by a non-root user is allowed to continue and reports the
/// refusal a real run would hit.
///
/// # Errors
///
/// Returns `ProvisionError::Privilege` for a non-root real run.
pub fn check(identity: &impl HostIdentity, dry_run: bool) -> Result<StepOutcome> {
    let euid = identity.effective_uid();
    if euid == 0 {
        return Ok(StepOutcome::AlreadySatisfied("running as root".to_string()));
    }
    if dry_run {
        return Ok(StepOutcome::Planned(format!(
            "effective uid is {euid}; a real run requires root"
        )));
    }
    Err(ProvisionError::Privilege { euid }.into())
}
