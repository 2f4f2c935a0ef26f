//! `vpn-agent-setup verify`: audit the provisioned end state.

use anyhow::Result;
use clap::Args;
use vpn_agent_common::HEALTHY_STATUS;

use crate::app::AppContext;
use crate::application::services::verify::{audit, check_health};
use crate::infra::fs::LocalHostFs;
use crate::infra::health::UreqHealthProbe;
use crate::infra::identity::NixIdentity;

/// Arguments for the verify command.
#[derive(Args)]
pub struct VerifyArgs {
    /// Also call the agent's health endpoint over TLS
    #[arg(long)]
    pub health: bool,
}

/// Run the verify command.
///
/// # Errors
///
/// Returns an error if any check fails, so the exit code reflects the audit.
pub async fn run(ctx: &AppContext, args: &VerifyArgs) -> Result<()> {
    let cfg = &ctx.config;
    let fs = LocalHostFs;
    let mut report = audit(&fs, &NixIdentity, cfg)?;
    if args.health {
        report
            .findings
            .push(check_health(&fs, &UreqHealthProbe, cfg).await?);
    }

    if ctx.is_json() {
        let status = if report.healthy() { HEALTHY_STATUS } else { "unhealthy" };
        crate::output::json::print(&serde_json::json!({
            "status": status,
            "findings": report.findings,
        }))?;
    } else {
        ctx.human().render_verify(&report);
    }

    if !report.healthy() {
        anyhow::bail!("{} verification check(s) failed", report.failures());
    }
    Ok(())
}
