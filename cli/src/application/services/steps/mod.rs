//! The provisioning steps.
//!
//! Every step is a check-then-act function: it inspects the host, returns
//! `AlreadySatisfied` when nothing needs to change, `Planned` in dry-run,
//! and otherwise acts and returns `Created`. Failures carry a
//! [`ProvisionError`] kind.

pub mod access_control;
pub mod account;
pub mod deploy;
pub mod packages;
pub mod permissions;
pub mod privilege;
pub mod runtime_env;
pub mod secrets;
pub mod service_unit;

use std::path::Path;

use anyhow::Result;

use crate::application::ports::HostFs;
use crate::domain::{ProvisionError, StepOutcome};

/// Wrap a failure in the given `ProvisionError` kind, leaving errors that
/// already carry a kind untouched.
pub(crate) fn fail_as(
    kind: fn(String) -> ProvisionError,
) -> impl FnOnce(anyhow::Error) -> anyhow::Error {
    move |e| {
        if e.is::<ProvisionError>() {
            e
        } else {
            kind(format!("{e:#}")).into()
        }
    }
}

/// Read `path` if it exists.
pub(crate) fn read_if_exists(fs: &impl HostFs, path: &Path) -> Result<Option<Vec<u8>>> {
    if fs.exists(path) {
        fs.read(path).map(Some)
    } else {
        Ok(None)
    }
}

/// What a step found at a path it is about to compare.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Current {
    Absent,
    Present(Vec<u8>),
    /// Dry run only: the file exists but this user cannot read it.
    Unreadable,
}

impl Current {
    pub(crate) fn matches(&self, wanted: &[u8]) -> bool {
        matches!(self, Current::Present(bytes) if bytes.as_slice() == wanted)
    }
}

/// Read `path` for a check-then-act comparison. During a dry run a read
/// error yields `Current::Unreadable`, so non-root runs plan a change
/// instead of failing.
pub(crate) fn read_current(fs: &impl HostFs, path: &Path, dry_run: bool) -> Result<Current> {
    match read_if_exists(fs, path) {
        Ok(Some(bytes)) => Ok(Current::Present(bytes)),
        Ok(None) => Ok(Current::Absent),
        Err(e) if dry_run => {
            tracing::debug!(path = %path.display(), error = %e, "unreadable during dry run");
            Ok(Current::Unreadable)
        }
        Err(e) => Err(fail_as(ProvisionError::Filesystem)(e)),
    }
}

/// Changes a multi-part step made (or would make).
#[derive(Debug, Default)]
pub(crate) struct Changes(Vec<String>);

impl Changes {
    pub(crate) fn push(&mut self, change: impl Into<String>) {
        self.0.push(change.into());
    }

    pub(crate) fn into_outcome(self, dry_run: bool, satisfied: &str) -> StepOutcome {
        if self.0.is_empty() {
            StepOutcome::AlreadySatisfied(satisfied.to_string())
        } else if dry_run {
            StepOutcome::Planned(self.0.join("; "))
        } else {
            StepOutcome::Created(self.0.join("; "))
        }
    }
}
