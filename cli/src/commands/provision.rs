//! `vpn-agent-setup provision`: run the provisioning pipeline.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{HostFs, HostIdentity};
use crate::application::services::pipeline::{Host, ProvisionOptions, provision};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fs::LocalHostFs;
use crate::infra::identity::NixIdentity;
use crate::infra::state::StateManager;
use crate::output::json;
use crate::output::reporter::TerminalReporter;

/// Arguments for the provision command.
#[derive(Args)]
pub struct ProvisionArgs {
    /// Directory holding `app/`, `requirements.txt` and `.env.example`
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub source: PathBuf,

    /// Reseed the configuration file even if it was edited
    #[arg(long)]
    pub force: bool,

    /// Regenerate the TLS key pair even if it is still valid
    #[arg(long)]
    pub force_secrets: bool,

    /// Show what would change without modifying the host
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the provision command.
///
/// # Errors
///
/// Returns the first failing step's error, or an error if the operator
/// declines to regenerate existing secrets.
pub async fn run(ctx: &AppContext, args: ProvisionArgs) -> Result<()> {
    let cfg = &ctx.config;
    let fs = LocalHostFs;
    let identity = NixIdentity;

    // A non-root real run stops at the privilege gate; don't prompt first.
    let mut force_secrets = args.force_secrets;
    let may_regenerate = !args.dry_run && identity.effective_uid() == 0;
    if force_secrets && may_regenerate && fs.exists(&cfg.key_file()) {
        let prompt = format!(
            "Regenerate the TLS key pair in {}? Clients pinning the current certificate will stop trusting the agent.",
            cfg.paths.config_root.display()
        );
        if !(ctx.non_interactive || ctx.confirm(&prompt, false)?) {
            ctx.output.caution("Keeping the existing TLS key pair.");
            force_secrets = false;
        }
    }

    let opts = ProvisionOptions {
        source: args.source,
        force_config: args.force,
        force_secrets,
        dry_run: args.dry_run,
    };
    let runner = TokioCommandRunner::default();
    let host = Host {
        runner: &runner,
        fs: &fs,
        identity: &identity,
    };
    let store = StateManager::new(cfg.state_file(), cfg.lock_file());
    let reporter = TerminalReporter::new(&ctx.output);

    let mode = if opts.dry_run { " (dry run)" } else { "" };
    ctx.output
        .heading(&format!("Provisioning '{}'{mode}", cfg.account.name));
    let report = provision(&host, &store, &reporter, cfg, &opts).await?;

    if ctx.is_json() {
        json::print(&report)?;
    } else {
        ctx.human().render_report(&report, cfg);
        if reporter.warnings() > 0 {
            ctx.output
                .note(format_args!("{} warning(s) above need attention.", reporter.warnings()));
        }
    }
    Ok(())
}
