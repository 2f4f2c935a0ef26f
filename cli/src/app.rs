//! State shared by every command once the configuration is loaded.

use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::domain::SetupConfig;
use crate::infra::config::YamlConfigStore;
use crate::output::OutputContext;
use crate::output::human::HumanRenderer;

pub struct AppContext {
    /// Quiet in JSON mode so stdout carries only the JSON document.
    pub output: OutputContext,
    /// Validated setup configuration.
    pub config: SetupConfig,
    /// Answer every prompt with its default (`--yes` or `CI` set).
    pub non_interactive: bool,
    json: bool,
}

impl AppContext {
    /// Load the configuration named by `--config`, the environment, or the
    /// default location, and set up terminal output.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration cannot be read or is invalid.
    pub fn new(global: &GlobalArgs) -> Result<Self> {
        let config = YamlConfigStore::new(global.config.clone()).load()?;
        Ok(Self {
            output: OutputContext::new(global.no_color, global.quiet || global.json),
            config,
            non_interactive: global.yes || std::env::var_os("CI").is_some(),
            json: global.json,
        })
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        self.json
    }

    #[must_use]
    pub fn human(&self) -> HumanRenderer<'_> {
        HumanRenderer::new(&self.output)
    }

    /// Ask a yes/no question; non-interactive runs get `default`.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be shown (no TTY).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        Ok(dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }
}
