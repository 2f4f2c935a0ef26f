//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::time::Duration;

use thiserror::Error;

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Failure kinds of the provisioning pipeline. Every kind is fatal.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Root privileges required (effective uid is {euid}). Re-run with sudo.")]
    Privilege { euid: u32 },

    #[error("Service account '{account}': {reason}")]
    Account { account: String, reason: String },

    #[error("Package installation failed: {0}")]
    DependencyInstall(String),

    #[error("{what} timed out after {}s ({attempts} attempt(s))", .after.as_secs())]
    Timeout {
        what: String,
        after: Duration,
        attempts: u32,
    },

    #[error("Filesystem operation failed: {0}")]
    Filesystem(String),

    #[error("TLS key pair generation failed: {0}")]
    SecretGeneration(String),

    #[error("Privilege grant rejected: {0}")]
    Validation(String),

    #[error("Permission enforcement failed: {0}")]
    Permission(String),

    #[error("Service registration failed: {0}")]
    ServiceRegistration(String),

    #[error("Another provisioning run holds the lock at {path}")]
    Lock { path: String },
}

impl ProvisionError {
    /// Process exit code for this failure kind.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            // sysexits.h EX_NOPERM / EX_TEMPFAIL
            ProvisionError::Privilege { .. } => 77,
            ProvisionError::Lock { .. } => 75,
            _ => 1,
        }
    }

    /// Stable machine-readable code for `--json` error objects.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ProvisionError::Privilege { .. } => "PRIVILEGE",
            ProvisionError::Account { .. } => "ACCOUNT",
            ProvisionError::DependencyInstall(_) => "DEPENDENCY_INSTALL",
            ProvisionError::Timeout { .. } => "TIMEOUT",
            ProvisionError::Filesystem(_) => "FILESYSTEM",
            ProvisionError::SecretGeneration(_) => "SECRET_GENERATION",
            ProvisionError::Validation(_) => "VALIDATION",
            ProvisionError::Permission(_) => "PERMISSION",
            ProvisionError::ServiceRegistration(_) => "SERVICE_REGISTRATION",
            ProvisionError::Lock { .. } => "LOCK",
        }
    }
}

// ── Command errors ────────────────────────────────────────────────────────────

/// A child process was killed after exceeding its timeout.
#[derive(Debug, Error)]
#[error("{program} timed out after {}s", .after.as_secs())]
pub struct CommandTimeout {
    pub program: String,
    pub after: Duration,
}

/// A child process exited with a non-zero status.
#[derive(Debug, Error)]
#[error("{program} exited with {code}: {stderr}")]
pub struct CommandFailed {
    pub program: String,
    pub code: String,
    pub stderr: String,
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to setup configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid account name '{0}': must match ^[a-z_][a-z0-9_-]{{0,31}}$")]
    InvalidAccountName(String),

    #[error("{field} must be an absolute path, got '{value}'")]
    RelativePath { field: &'static str, value: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
