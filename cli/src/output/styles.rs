//! Colour palette for provisioning output.

use owo_colors::Style;

/// One style per kind of line the tool prints.
///
/// `Styles::default()` is the plain palette used when colour is off.
#[derive(Debug, Default, Clone, Copy)]
pub struct Styles {
    /// A step changed the host.
    pub changed: Style,
    /// A step found the host already in shape.
    pub unchanged: Style,
    /// Dry-run: a step would change the host.
    pub planned: Style,
    /// Step currently running.
    pub running: Style,
    pub caution: Style,
    pub failure: Style,
    pub heading: Style,
    /// Labels in `label  value` rows.
    pub label: Style,
}

impl Styles {
    /// Palette for a colour terminal.
    #[must_use]
    pub fn coloured() -> Self {
        Self {
            changed: Style::new().green().bold(),
            unchanged: Style::new().green(),
            planned: Style::new().cyan(),
            running: Style::new().dimmed(),
            caution: Style::new().yellow(),
            failure: Style::new().red().bold(),
            heading: Style::new().bold(),
            label: Style::new().dimmed(),
        }
    }
}
