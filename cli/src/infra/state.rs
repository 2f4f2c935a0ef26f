//! Infrastructure implementation of the `ProvisionStateStore` port.
//!
//! `StateManager` persists the provisioning marker with an atomic write
//! (temp file + rename) and guards runs with an advisory `flock`.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use crate::application::ports::ProvisionStateStore;
use crate::domain::{ProvisionError, ProvisionState};

/// `ProvisionStateStore` backed by a JSON state file and an flock'd lock file.
pub struct StateManager {
    path: PathBuf,
    lock_path: PathBuf,
}

impl StateManager {
    #[must_use]
    pub fn new(path: PathBuf, lock_path: PathBuf) -> Self {
        Self { path, lock_path }
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        Ok(())
    }
}

/// Exclusive run lock, released when dropped.
struct RunLock(File);

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

impl ProvisionStateStore for StateManager {
    fn load(&self) -> Result<ProvisionState> {
        if !self.path.exists() {
            return Ok(ProvisionState::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading state file {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("parsing state file {}", self.path.display()))
    }

    fn save(&self, state: &ProvisionState) -> Result<()> {
        Self::ensure_parent(&self.path)?;
        let content = serde_json::to_string_pretty(state).context("serializing state")?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }
        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("finalizing state file {}", self.path.display()))?;
        Ok(())
    }

    fn lock(&self) -> Result<Box<dyn std::any::Any>> {
        Self::ensure_parent(&self.lock_path)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .with_context(|| format!("opening lock file {}", self.lock_path.display()))?;
        if file.try_lock_exclusive().is_err() {
            return Err(ProvisionError::Lock {
                path: self.lock_path.display().to_string(),
            }
            .into());
        }
        tracing::debug!(path = %self.lock_path.display(), "acquired run lock");
        Ok(Box::new(RunLock(file)))
    }
}
