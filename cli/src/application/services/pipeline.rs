//! The provisioning pipeline: nine steps run in order against the host ports.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Steps run strictly in order; the first failure aborts the run and leaves
//! the completed prefix in place.

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::Instrument;

use crate::application::ports::{
    CommandRunner, HostFs, HostIdentity, ProgressReporter, ProvisionStateStore,
};
use crate::application::services::exec::RetryPolicy;
use crate::application::services::steps::{
    access_control, account, deploy, packages, permissions, privilege, runtime_env, secrets,
    service_unit,
};
use crate::domain::config::SetupConfig;
use crate::domain::{ProvisionReport, ProvisionState, StepId, StepOutcome};

/// The host-facing ports a run acts through.
pub struct Host<'a, R, F, I> {
    pub runner: &'a R,
    pub fs: &'a F,
    pub identity: &'a I,
}

/// Options of one provisioning run.
#[derive(Debug, Clone, Default)]
pub struct ProvisionOptions {
    /// Directory holding the application source, manifest and template.
    pub source: PathBuf,
    /// Reseed the configuration file even if the operator edited it.
    pub force_config: bool,
    /// Regenerate a still-valid TLS key pair.
    pub force_secrets: bool,
    /// Inspect only; report what would change.
    pub dry_run: bool,
}

/// Run every provisioning step in order.
///
/// The privilege gate runs before anything else touches the host. A real
/// run then takes the exclusive run lock and loads the provisioning marker.
///
/// # Errors
///
/// Returns the first step failure, wrapped with the step's label. The
/// underlying `ProvisionError` stays reachable through `downcast_ref`.
pub async fn provision(
    host: &Host<'_, impl CommandRunner, impl HostFs, impl HostIdentity>,
    store: &impl ProvisionStateStore,
    reporter: &impl ProgressReporter,
    cfg: &SetupConfig,
    opts: &ProvisionOptions,
) -> Result<ProvisionReport> {
    let Host { runner, fs, identity } = *host;
    let dry_run = opts.dry_run;
    let policy = RetryPolicy::from_config(&cfg.network);
    let mut report = ProvisionReport {
        dry_run,
        steps: Vec::new(),
    };

    run_step(&mut report, reporter, StepId::PrivilegeGate, async {
        let gate = privilege::check(identity, dry_run)?;
        if let StepOutcome::Planned(detail) = &gate {
            reporter.warn(detail);
        }
        Ok::<_, anyhow::Error>(gate)
    })
    .await?;

    let _lock = if dry_run { None } else { Some(store.lock()?) };
    let mut state = if dry_run {
        store.load().unwrap_or_default()
    } else {
        store.load().context("loading provisioning state")?
    };

    run_step(
        &mut report,
        reporter,
        StepId::Account,
        account::ensure(runner, identity, &cfg.account, dry_run),
    )
    .await?;

    run_step(
        &mut report,
        reporter,
        StepId::Dependencies,
        packages::ensure(runner, &cfg.packages, &policy, dry_run),
    )
    .await?;

    let deploy_opts = deploy::DeployOptions {
        source: &opts.source,
        force_config: opts.force_config,
        dry_run,
    };
    run_step(&mut report, reporter, StepId::Filesystem, async {
        deploy::ensure(fs, reporter, cfg, &mut state, &deploy_opts)
    })
    .await?;
    save(store, &state, dry_run)?;

    run_step(
        &mut report,
        reporter,
        StepId::RuntimeEnvironment,
        runtime_env::ensure(runner, fs, cfg, &mut state, &policy, dry_run),
    )
    .await?;
    save(store, &state, dry_run)?;

    run_step(
        &mut report,
        reporter,
        StepId::Secrets,
        secrets::ensure(runner, fs, cfg, opts.force_secrets, dry_run),
    )
    .await?;

    run_step(
        &mut report,
        reporter,
        StepId::AccessControl,
        access_control::ensure(runner, fs, cfg, dry_run),
    )
    .await?;

    run_step(
        &mut report,
        reporter,
        StepId::Permissions,
        permissions::ensure(runner, fs, identity, cfg, dry_run),
    )
    .await?;

    run_step(
        &mut report,
        reporter,
        StepId::Service,
        service_unit::ensure(runner, fs, cfg, dry_run),
    )
    .await?;

    if !dry_run {
        state.last_completed_at = Some(Utc::now());
        save(store, &state, dry_run)?;
    }
    tracing::info!(changed = report.changed(), dry_run, "provisioning finished");
    Ok(report)
}

/// Await one step inside its tracing span, report its outcome and record it.
async fn run_step(
    report: &mut ProvisionReport,
    reporter: &impl ProgressReporter,
    step: StepId,
    fut: impl Future<Output = Result<StepOutcome>>,
) -> Result<()> {
    reporter.step_started(step);
    let span = tracing::info_span!("step", step = %step);
    let outcome = fut
        .instrument(span)
        .await
        .with_context(|| failed(step))?;

    reporter.step_finished(step, &outcome);
    tracing::info!(step = %step, outcome = ?outcome, "step finished");
    report.record(step, outcome);
    Ok(())
}

fn failed(step: StepId) -> String {
    format!("{} step failed", step.label())
}

fn save(store: &impl ProvisionStateStore, state: &ProvisionState, dry_run: bool) -> Result<()> {
    if dry_run {
        return Ok(());
    }
    store.save(state).context("saving provisioning state")
}
