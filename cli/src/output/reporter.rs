//! Terminal side of the `ProgressReporter` port.

use std::cell::Cell;

use crate::application::ports::ProgressReporter;
use crate::domain::{StepId, StepOutcome};
use crate::output::OutputContext;

/// Prints one line per settled step, plus a transient "running" line on
/// interactive terminals so slow steps (apt, pip) show activity.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    live: bool,
    /// A running line is the last thing on screen.
    pending: Cell<bool>,
    warnings: Cell<usize>,
}

impl<'a> TerminalReporter<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        let live = !ctx.quiet && console::Term::stdout().is_term();
        Self {
            ctx,
            live,
            pending: Cell::new(false),
            warnings: Cell::new(0),
        }
    }

    /// Warnings emitted so far.
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.warnings.get()
    }
}

/// The line printed for a settled step.
#[must_use]
pub fn outcome_line(step: StepId, outcome: &StepOutcome) -> String {
    match outcome {
        StepOutcome::Planned(detail) => format!("{}: would {detail}", step.label()),
        StepOutcome::AlreadySatisfied(detail) | StepOutcome::Created(detail) => {
            format!("{}: {detail}", step.label())
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step_started(&self, step: StepId) {
        if self.live {
            self.ctx.running(format_args!("{}...", step.label()));
            self.pending.set(true);
        }
    }

    fn step_finished(&self, step: StepId, outcome: &StepOutcome) {
        if self.pending.replace(false) {
            let _ = console::Term::stdout().clear_last_lines(1);
        }
        let line = outcome_line(step, outcome);
        match outcome {
            StepOutcome::Created(_) => self.ctx.changed(line),
            StepOutcome::AlreadySatisfied(_) => self.ctx.unchanged(line),
            StepOutcome::Planned(_) => self.ctx.planned(line),
        }
    }

    fn warn(&self, message: &str) {
        self.warnings.set(self.warnings.get() + 1);
        self.pending.set(false);
        self.ctx.caution(message);
    }
}
