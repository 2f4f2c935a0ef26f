//! Domain types and validators for the setup configuration.
//!
//! No I/O here: loading lives in `infra::config`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use vpn_agent_common::{CERT_FILE, DEFAULT_SACLI_PATH, ENV_FILE, KEY_FILE};

use crate::domain::error::ConfigError;

static ACCOUNT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)] // literal pattern
    Regex::new(r"^[a-z_][a-z0-9_-]{0,31}$").expect("valid account regex")
});

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level setup configuration, usually `/etc/vpn-agent-setup.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SetupConfig {
    pub account: AccountConfig,
    pub paths: PathsConfig,
    pub source: SourceConfig,
    /// Host packages the agent needs at runtime.
    pub packages: Vec<String>,
    pub tls: TlsConfig,
    pub service: ServiceConfig,
    pub network: NetworkConfig,
    /// Absolute path of the `sacli` binary named in the grant.
    pub sacli_path: String,
}

/// Service account identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub name: String,
    pub home: PathBuf,
    pub shell: PathBuf,
}

/// Host locations written by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub app_root: PathBuf,
    pub config_root: PathBuf,
    /// Root-owned directory for the provisioning marker and lock.
    pub state_dir: PathBuf,
    pub sudoers_file: PathBuf,
    pub unit_file: PathBuf,
}

/// Artifacts shipped with the agent, relative to `--source`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub app_dir: PathBuf,
    pub manifest: PathBuf,
    pub config_template: PathBuf,
}

/// Self-signed certificate parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    pub common_name: String,
    pub validity_days: u32,
    pub key_bits: u32,
    /// Existing certificates expiring within this window are regenerated.
    pub renew_within_days: u32,
}

/// systemd unit parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub description: String,
    /// Python module started by the unit (`python -m <module>`).
    pub module: String,
    pub restart: String,
    pub restart_sec: u32,
}

/// Timeout and retry policy for network-bound commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub command_timeout_secs: u64,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            name: "vpn-agent".to_string(),
            home: PathBuf::from("/home/vpn-agent"),
            shell: PathBuf::from("/bin/bash"),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            app_root: PathBuf::from("/opt/vpn-agent"),
            config_root: PathBuf::from("/etc/vpn-agent"),
            state_dir: PathBuf::from("/var/lib/vpn-agent-setup"),
            sudoers_file: PathBuf::from("/etc/sudoers.d/vpn-agent"),
            unit_file: PathBuf::from("/etc/systemd/system/vpn-agent.service"),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            app_dir: PathBuf::from("app"),
            manifest: PathBuf::from("requirements.txt"),
            config_template: PathBuf::from(".env.example"),
        }
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            common_name: "vpn-agent".to_string(),
            validity_days: 365,
            key_bits: 4096,
            renew_within_days: 30,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            description: "VPN Provisioning Agent".to_string(),
            module: "app.main".to_string(),
            restart: "always".to_string(),
            restart_sec: 5,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: 300,
            max_attempts: 3,
            initial_backoff_ms: 2000,
        }
    }
}

pub fn default_packages() -> Vec<String> {
    ["python3", "python3-venv", "python3-pip", "openssl"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

// ── Derived paths ────────────────────────────────────────────────────────────

impl SetupConfig {
    /// Built-in configuration used when no file is present.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            packages: default_packages(),
            sacli_path: DEFAULT_SACLI_PATH.to_string(),
            ..Self::default()
        }
    }

    /// Fill fields a partial YAML file left empty.
    #[must_use]
    pub fn with_fallbacks(mut self) -> Self {
        if self.packages.is_empty() {
            self.packages = default_packages();
        }
        if self.sacli_path.is_empty() {
            self.sacli_path = DEFAULT_SACLI_PATH.to_string();
        }
        self
    }

    #[must_use]
    pub fn env_file(&self) -> PathBuf {
        self.paths.config_root.join(ENV_FILE)
    }

    #[must_use]
    pub fn key_file(&self) -> PathBuf {
        self.paths.config_root.join(KEY_FILE)
    }

    #[must_use]
    pub fn cert_file(&self) -> PathBuf {
        self.paths.config_root.join(CERT_FILE)
    }

    /// Deployed application source directory.
    #[must_use]
    pub fn deployed_app_dir(&self) -> PathBuf {
        self.paths.app_root.join(leaf(&self.source.app_dir, "app"))
    }

    /// Deployed dependency manifest.
    #[must_use]
    pub fn deployed_manifest(&self) -> PathBuf {
        self.paths
            .app_root
            .join(leaf(&self.source.manifest, "requirements.txt"))
    }

    #[must_use]
    pub fn venv_dir(&self) -> PathBuf {
        self.paths.app_root.join("venv")
    }

    #[must_use]
    pub fn venv_python(&self) -> PathBuf {
        self.venv_dir().join("bin").join("python")
    }

    #[must_use]
    pub fn venv_pip(&self) -> PathBuf {
        self.venv_dir().join("bin").join("pip")
    }

    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.paths.state_dir.join("state.json")
    }

    #[must_use]
    pub fn lock_file(&self) -> PathBuf {
        self.paths.state_dir.join("provision.lock")
    }

    /// Systemd unit name derived from the unit file, e.g. `vpn-agent`.
    #[must_use]
    pub fn unit_name(&self) -> String {
        self.paths
            .unit_file
            .file_stem()
            .map_or_else(|| "vpn-agent".to_string(), |s| s.to_string_lossy().into_owned())
    }

    /// Check every value against its constraints.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<()> {
        validate_account_name(&self.account.name)?;
        for (field, path) in [
            ("account.home", &self.account.home),
            ("account.shell", &self.account.shell),
            ("paths.app_root", &self.paths.app_root),
            ("paths.config_root", &self.paths.config_root),
            ("paths.state_dir", &self.paths.state_dir),
            ("paths.sudoers_file", &self.paths.sudoers_file),
            ("paths.unit_file", &self.paths.unit_file),
        ] {
            require_absolute(field, path)?;
        }
        require_absolute("sacli_path", Path::new(&self.sacli_path))?;
        if self.paths.app_root == self.paths.config_root {
            return Err(invalid("paths.config_root", "must differ from paths.app_root"));
        }
        if self.packages.iter().any(|p| !is_package_name(p)) {
            return Err(invalid("packages", "contains an invalid package name"));
        }
        if self.tls.validity_days == 0 {
            return Err(invalid("tls.validity_days", "must be at least 1"));
        }
        if self.tls.key_bits < 2048 {
            return Err(invalid("tls.key_bits", "must be at least 2048"));
        }
        if self.tls.common_name.is_empty() || self.tls.common_name.contains('/') {
            return Err(invalid("tls.common_name", "must be non-empty without '/'"));
        }
        if self.network.max_attempts == 0 {
            return Err(invalid("network.max_attempts", "must be at least 1"));
        }
        if self.network.command_timeout_secs == 0 {
            return Err(invalid("network.command_timeout_secs", "must be at least 1"));
        }
        if self.service.module.is_empty() || self.service.module.contains(char::is_whitespace) {
            return Err(invalid("service.module", "must be a dotted module name"));
        }
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a service account name.
///
/// # Errors
///
/// Returns an error if the name is not a valid system account name.
pub fn validate_account_name(name: &str) -> Result<()> {
    if !ACCOUNT_NAME.is_match(name) {
        return Err(ConfigError::InvalidAccountName(name.to_string()).into());
    }
    Ok(())
}

fn require_absolute(field: &'static str, path: &Path) -> Result<()> {
    if !path.is_absolute() {
        return Err(ConfigError::RelativePath {
            field,
            value: path.display().to_string(),
        }
        .into());
    }
    Ok(())
}

fn invalid(field: &'static str, reason: &str) -> anyhow::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
    .into()
}

fn is_package_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "+-.:".contains(c))
}

fn leaf(path: &Path, fallback: &str) -> PathBuf {
    path.file_name()
        .map_or_else(|| PathBuf::from(fallback), PathBuf::from)
}

// ── Unit tests ───────────────────────────────────────────────────────────────
