//! Agent settings as read from the `.env` file in the configuration root.
//!
//! Keys are case-insensitive. Unknown keys are ignored so operators can keep
//! their own entries in the same file.

use serde::Serialize;
use thiserror::Error;

use crate::health::DEFAULT_PORT;
use crate::sacli::DEFAULT_SACLI_PATH;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("line {line}: expected KEY=VALUE, got '{content}'")]
    MalformedLine { line: usize, content: String },

    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Settings consumed by the agent at start-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSettings {
    /// Shared secret expected in the `X-API-Key` header.
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Comma-separated caller allowlist; empty means no restriction.
    pub allowed_ips: String,
    pub host: String,
    pub port: u16,
    pub sacli_path: String,
    pub admin_ui_url: String,
}

impl AgentSettings {
    /// Parse settings from `.env` content.
    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let mut api_key = None;
        let mut allowed_ips = String::new();
        let mut host = "0.0.0.0".to_string();
        let mut port = DEFAULT_PORT;
        let mut sacli_path = DEFAULT_SACLI_PATH.to_string();
        let mut admin_ui_url = "https://localhost:943".to_string();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);
            let Some((key, value)) = line.split_once('=') else {
                return Err(SettingsError::MalformedLine {
                    line: idx + 1,
                    content: raw.to_string(),
                });
            };
            let value = unquote(value.trim()).to_string();
            match key.trim().to_ascii_uppercase().as_str() {
                "API_KEY" => api_key = Some(value),
                "ALLOWED_IPS" => allowed_ips = value,
                "HOST" => host = value,
                "PORT" => {
                    port = value.parse().map_err(|_| SettingsError::InvalidValue {
                        key: "PORT",
                        value: value.clone(),
                    })?;
                }
                "SACLI_PATH" => sacli_path = value,
                "ADMIN_UI_URL" => admin_ui_url = value,
                _ => {}
            }
        }

        Ok(Self {
            api_key: api_key.ok_or(SettingsError::Missing("API_KEY"))?,
            allowed_ips,
            host,
            port,
            sacli_path,
            admin_ui_url,
        })
    }

    /// Allowed caller addresses with blanks dropped.
    #[must_use]
    pub fn allowed_ip_list(&self) -> Vec<&str> {
        self.allowed_ips
            .split(',')
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .collect()
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
