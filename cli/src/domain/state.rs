//! Provisioning marker persisted between runs.
//!
//! The marker lets reruns tell operator edits apart from files this tool
//! seeded, and skip rebuilding an environment whose manifest is unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionState {
    /// SHA-256 of the configuration file content last written by a seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeded_config_sha256: Option<String>,
    /// SHA-256 of the manifest the runtime environment was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_manifest_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed_at: Option<DateTime<Utc>>,
}

/// Whether an installed configuration file was edited since it was seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStatus {
    /// No file is installed.
    Missing,
    /// Installed content is what this tool last seeded.
    Pristine,
    /// Content differs from the last seed, or no seed was recorded.
    Customized,
}

impl ProvisionState {
    /// Classify an installed configuration file by its content hash.
    #[must_use]
    pub fn seed_status(&self, installed_sha256: Option<&str>) -> SeedStatus {
        match (installed_sha256, self.seeded_config_sha256.as_deref()) {
            (None, _) => SeedStatus::Missing,
            (Some(installed), Some(seeded)) if installed == seeded => SeedStatus::Pristine,
            (Some(_), _) => SeedStatus::Customized,
        }
    }

    /// Whether the runtime environment was built from this manifest.
    #[must_use]
    pub fn runtime_matches(&self, manifest_sha256: &str) -> bool {
        self.runtime_manifest_sha256.as_deref() == Some(manifest_sha256)
    }
}

/// Hex-encoded SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex_encode(&Sha256::digest(bytes))
}

/// Lower-case hex encoding.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
