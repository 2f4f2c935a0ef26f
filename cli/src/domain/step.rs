//! Pipeline step identities and their tri-state outcomes.

use std::fmt;

use serde::Serialize;

/// The provisioning steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    PrivilegeGate,
    Account,
    Dependencies,
    Filesystem,
    RuntimeEnvironment,
    Secrets,
    AccessControl,
    Permissions,
    Service,
}

impl StepId {
    pub const ORDER: [StepId; 9] = [
        StepId::PrivilegeGate,
        StepId::Account,
        StepId::Dependencies,
        StepId::Filesystem,
        StepId::RuntimeEnvironment,
        StepId::Secrets,
        StepId::AccessControl,
        StepId::Permissions,
        StepId::Service,
    ];

    /// Human label used in progress lines and error context.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            StepId::PrivilegeGate => "privilege gate",
            StepId::Account => "service account",
            StepId::Dependencies => "host packages",
            StepId::Filesystem => "application files",
            StepId::RuntimeEnvironment => "runtime environment",
            StepId::Secrets => "TLS key pair",
            StepId::AccessControl => "privilege grant",
            StepId::Permissions => "ownership and permissions",
            StepId::Service => "service unit",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a check-then-act step. Failure is the `Err` side of `Result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "kebab-case")]
pub enum StepOutcome {
    /// Host already in the desired state; nothing changed.
    AlreadySatisfied(String),
    /// The step changed host state.
    Created(String),
    /// Dry-run: the step would change host state.
    Planned(String),
}

impl StepOutcome {
    #[must_use]
    pub fn changed(&self) -> bool {
        matches!(self, StepOutcome::Created(_))
    }
}

/// Ordered outcomes of one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProvisionReport {
    pub dry_run: bool,
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: StepId,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

impl ProvisionReport {
    pub fn record(&mut self, step: StepId, outcome: StepOutcome) {
        self.steps.push(StepRecord { step, outcome });
    }

    #[must_use]
    pub fn outcome(&self, step: StepId) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|r| r.step == step)
            .map(|r| &r.outcome)
    }

    /// Number of steps that changed host state.
    #[must_use]
    pub fn changed(&self) -> usize {
        self.steps.iter().filter(|r| r.outcome.changed()).count()
    }
}
