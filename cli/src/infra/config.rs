//! Loading of the setup configuration from YAML.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::domain::SetupConfig;

/// Default location of the setup configuration.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/vpn-agent-setup.yaml";

/// Environment variable overriding the configuration path.
pub const CONFIG_ENV: &str = "VPN_AGENT_SETUP_CONFIG";

/// Reads `SetupConfig` from a YAML file on disk.
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    /// Use `path`, or the default location when none is given.
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
        }
    }

    /// Load and validate the configuration. A missing file yields the
    /// built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a value
    /// fails validation.
    pub fn load(&self) -> Result<SetupConfig> {
        let cfg = if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)
                .with_context(|| format!("cannot read {}", self.path.display()))?;
            let parsed: SetupConfig = serde_yaml::from_str(&content)
                .with_context(|| format!("cannot parse {}", self.path.display()))?;
            parsed.with_fallbacks()
        } else {
            tracing::debug!(path = %self.path.display(), "no setup configuration; using defaults");
            SetupConfig::builtin()
        };
        cfg.validate()
            .with_context(|| format!("invalid configuration in {}", self.path.display()))?;
        Ok(cfg)
    }
}
