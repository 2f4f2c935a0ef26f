//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{ProvisionState, StepId, StepOutcome};

// ── Value Types ───────────────────────────────────────────────────────────────

/// A host account as found in the passwd database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAccount {
    pub name: String,
    pub uid: u32,
    pub home: PathBuf,
    pub shell: PathBuf,
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned) and
    /// the error must downcast to `CommandTimeout`.
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Host Identity Port ────────────────────────────────────────────────────────

/// Identity lookups against the host's user database.
pub trait HostIdentity {
    /// Effective uid of the current process.
    fn effective_uid(&self) -> u32;
    /// Look up an account by name, returning `None` if it does not exist.
    fn lookup_account(&self, name: &str) -> Result<Option<ServiceAccount>>;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Filesystem operations the pipeline performs on host paths.
pub trait HostFs {
    fn exists(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    /// Write `content` via a temp file in the same directory and rename it
    /// into place, applying `mode` before the rename.
    fn write_atomic(&self, path: &Path, content: &[u8], mode: u32) -> Result<()>;
    /// Paths (relative to `src`) of files whose copy under `dst` is missing
    /// or has different content.
    fn diff_tree(&self, src: &Path, dst: &Path) -> Result<Vec<PathBuf>>;
    /// Mirror `src` into `dst`, copying only files whose content differs.
    /// Returns the number of files written.
    fn sync_tree(&self, src: &Path, dst: &Path) -> Result<usize>;
    /// Write `content` to a fresh dot-file next to `live` with `mode` and
    /// return its path. Nothing at `live` changes.
    fn stage(&self, live: &Path, content: &[u8], mode: u32) -> Result<PathBuf>;
    /// Atomically replace `to` with `from`.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn set_mode(&self, path: &Path, mode: u32) -> Result<()>;
    /// Permission bits (`0o7777` mask) of `path`.
    fn mode(&self, path: &Path) -> Result<u32>;
    /// Owning uid of `path`.
    fn owner(&self, path: &Path) -> Result<u32>;
}

// ── State Port ────────────────────────────────────────────────────────────────

/// Persistence of the provisioning marker and the run lock.
pub trait ProvisionStateStore {
    /// Load the marker, returning the default state if none exists.
    fn load(&self) -> Result<ProvisionState>;
    /// Persist the marker.
    fn save(&self, state: &ProvisionState) -> Result<()>;
    /// Take the exclusive run lock. The lock is held until the returned
    /// guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::Lock` if another run holds it.
    fn lock(&self) -> Result<Box<dyn std::any::Any>>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Receives pipeline progress. Implemented by the terminal reporter and by
/// test recorders; never called from `domain`.
pub trait ProgressReporter {
    /// A step is about to inspect the host.
    fn step_started(&self, step: StepId);
    /// A step settled; `outcome` says whether it changed anything.
    fn step_finished(&self, step: StepId, outcome: &StepOutcome);
    /// Something the operator should look at, without failing the run.
    fn warn(&self, message: &str);
}

// ── Health Port ───────────────────────────────────────────────────────────────

/// Calls the agent's authenticated health endpoint.
#[allow(async_fn_in_trait)]
pub trait HealthProbe {
    /// Return the HTTP status of `GET url` sent with the API key header,
    /// trusting only the certificate at `ca_cert`.
    async fn probe(&self, url: &str, api_key: &str, ca_cert: &Path) -> Result<u16>;
}
