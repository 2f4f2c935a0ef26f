//! Human-readable summaries printed after a command finishes.

use crate::application::services::verify::VerifyReport;
use crate::domain::{ProvisionReport, SetupConfig, StepOutcome};
use crate::output::OutputContext;

pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Summarize a provisioning run and print the operator's next steps.
    pub fn render_report(&self, report: &ProvisionReport, cfg: &SetupConfig) {
        self.ctx.blank();
        if report.dry_run {
            let planned = report
                .steps
                .iter()
                .filter(|r| matches!(r.outcome, StepOutcome::Planned(_)))
                .count();
            self.ctx.heading("Dry run complete.");
            self.ctx.note(format_args!(
                "{planned} step(s) would change the host. Nothing was modified."
            ));
            return;
        }

        match report.changed() {
            0 => self.ctx.unchanged("Host already provisioned. Nothing changed."),
            n => self
                .ctx
                .changed(format_args!("Provisioning complete: {n} step(s) changed the host.")),
        }

        self.ctx.blank();
        self.ctx.heading("Next steps:");
        self.ctx.field("Review settings", cfg.env_file().display());
        self.ctx.field(
            "Start the agent",
            format_args!("systemctl enable --now {}", cfg.unit_name()),
        );
        self.ctx.field("Check health", "vpn-agent-setup verify --health");
    }

    /// One line per check; failed checks go to stderr.
    pub fn render_verify(&self, report: &VerifyReport) {
        for finding in &report.findings {
            let line = format!("{}: {}", finding.check, finding.detail);
            if finding.ok {
                self.ctx.unchanged(line);
            } else {
                self.ctx.failure(line);
            }
        }
        self.ctx.blank();
        if report.healthy() {
            self.ctx.changed("All checks passed.");
        } else {
            self.ctx
                .caution(format_args!("{} check(s) failed.", report.failures()));
            self.ctx.note("Run: sudo vpn-agent-setup provision");
        }
    }
}
