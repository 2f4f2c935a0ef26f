//! Terminal output: palette, line helpers and the renderers built on them.
//!
//! Progress goes to stdout and is silenced by `--quiet` and `--json`.
//! Failures go to stderr and are always printed.

pub mod human;
pub mod json;
pub mod reporter;
pub mod styles;

use std::fmt::Display;

use console::Term;
use owo_colors::{OwoColorize as _, Style};
pub use styles::Styles;

/// Marker glyphs, one per line kind.
pub mod glyph {
    pub const RUNNING: &str = "…";
    pub const CHANGED: &str = "✓";
    pub const UNCHANGED: &str = "·";
    pub const PLANNED: &str = "→";
    pub const CAUTION: &str = "⚠";
    pub const FAILURE: &str = "✗";
    pub const NOTE: &str = "ℹ";
}

/// Where and how lines are printed.
pub struct OutputContext {
    pub styles: Styles,
    /// Drop everything except failures.
    pub quiet: bool,
}

impl OutputContext {
    /// Colour is used only on a terminal, and never when `no_color` is set
    /// or `NO_COLOR` is present.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let colour = !no_color
            && std::env::var_os("NO_COLOR").is_none()
            && Term::stdout().features().colors_supported();
        Self {
            styles: if colour { Styles::coloured() } else { Styles::default() },
            quiet,
        }
    }

    /// Render one marked line without printing it.
    #[must_use]
    pub fn marked(&self, glyph: &str, style: Style, msg: impl Display) -> String {
        format!("  {} {msg}", glyph.style(style))
    }

    fn emit(&self, glyph: &str, style: Style, msg: impl Display) {
        if !self.quiet {
            println!("{}", self.marked(glyph, style, msg));
        }
    }

    pub fn running(&self, msg: impl Display) {
        self.emit(glyph::RUNNING, self.styles.running, msg);
    }

    pub fn changed(&self, msg: impl Display) {
        self.emit(glyph::CHANGED, self.styles.changed, msg);
    }

    pub fn unchanged(&self, msg: impl Display) {
        self.emit(glyph::UNCHANGED, self.styles.unchanged, msg);
    }

    pub fn planned(&self, msg: impl Display) {
        self.emit(glyph::PLANNED, self.styles.planned, msg);
    }

    pub fn caution(&self, msg: impl Display) {
        self.emit(glyph::CAUTION, self.styles.caution, msg);
    }

    pub fn note(&self, msg: impl Display) {
        self.emit(glyph::NOTE, self.styles.label, msg);
    }

    /// Printed to stderr even when quiet.
    pub fn failure(&self, msg: impl Display) {
        eprintln!("{}", self.marked(glyph::FAILURE, self.styles.failure, msg));
    }

    pub fn heading(&self, title: &str) {
        if !self.quiet {
            println!("{}", title.style(self.styles.heading));
        }
    }

    /// A `label  value` row, labels padded so values line up.
    pub fn field(&self, label: &str, value: impl Display) {
        if !self.quiet {
            println!("  {:<18} {value}", label.style(self.styles.label));
        }
    }

    pub fn blank(&self) {
        if !self.quiet {
            println!();
        }
    }
}
