//! Filesystem deployment: roots, application source, manifest, and the
//! seeded configuration file.

use std::path::{Path, PathBuf};

use anyhow::Result;
use vpn_agent_common::AgentSettings;

use crate::application::ports::{HostFs, ProgressReporter};
use crate::application::services::steps::{Changes, Current, fail_as, read_current};
use crate::domain::config::SetupConfig;
use crate::domain::state::sha256_hex;
use crate::domain::{ProvisionError, ProvisionState, SeedStatus, StepOutcome};

const ROOT_MODE: u32 = 0o755;
const MANIFEST_MODE: u32 = 0o644;
const SECRET_MODE: u32 = 0o600;

/// Inputs of the deploy step.
pub struct DeployOptions<'a> {
    /// Directory holding the shipped artifacts.
    pub source: &'a Path,
    /// Reseed the configuration file even if it was customized.
    pub force_config: bool,
    pub dry_run: bool,
}

/// Ensure both roots exist, the application tree and manifest match the
/// source, and the configuration file is seeded.
///
/// A configuration file the operator edited since the last seed is kept.
///
/// # Errors
///
/// Returns `ProvisionError::Filesystem` if a source artifact is missing, the
/// template is not valid agent settings, or a write fails.
pub fn ensure(
    fs: &impl HostFs,
    reporter: &impl ProgressReporter,
    cfg: &SetupConfig,
    state: &mut ProvisionState,
    opts: &DeployOptions<'_>,
) -> Result<StepOutcome> {
    let src_app = opts.source.join(&cfg.source.app_dir);
    let src_manifest = opts.source.join(&cfg.source.manifest);
    let src_template = opts.source.join(&cfg.source.config_template);
    for required in [&src_app, &src_manifest, &src_template] {
        if !fs.exists(required) {
            return Err(ProvisionError::Filesystem(format!(
                "source artifact {} not found",
                required.display()
            ))
            .into());
        }
    }

    let mut changes = Changes::default();
    ensure_roots(fs, cfg, opts.dry_run, &mut changes)?;
    sync_source(fs, cfg, &src_app, &src_manifest, opts.dry_run, &mut changes)?;
    seed_config(fs, reporter, cfg, state, &src_template, opts, &mut changes)?;

    Ok(changes.into_outcome(opts.dry_run, "application files up to date"))
}

fn ensure_roots(
    fs: &impl HostFs,
    cfg: &SetupConfig,
    dry_run: bool,
    changes: &mut Changes,
) -> Result<()> {
    for root in [&cfg.paths.app_root, &cfg.paths.config_root] {
        if fs.exists(root) {
            continue;
        }
        changes.push(format!("create {}", root.display()));
        if !dry_run {
            fs.create_dir_all(root)
                .and_then(|()| fs.set_mode(root, ROOT_MODE))
                .map_err(fail_as(ProvisionError::Filesystem))?;
        }
    }
    Ok(())
}

fn sync_source(
    fs: &impl HostFs,
    cfg: &SetupConfig,
    src_app: &Path,
    src_manifest: &Path,
    dry_run: bool,
    changes: &mut Changes,
) -> Result<()> {
    let dst_app = cfg.deployed_app_dir();
    if dry_run {
        let stale = fs
            .diff_tree(src_app, &dst_app)
            .map_err(fail_as(ProvisionError::Filesystem))?;
        if !stale.is_empty() {
            changes.push(format!("copy {} application file(s)", stale.len()));
        }
    } else {
        let copied = fs
            .sync_tree(src_app, &dst_app)
            .map_err(fail_as(ProvisionError::Filesystem))?;
        if copied > 0 {
            tracing::info!(copied, dest = %dst_app.display(), "synced application source");
            changes.push(format!("copied {copied} application file(s)"));
        }
    }

    let manifest = fs
        .read(src_manifest)
        .map_err(fail_as(ProvisionError::Filesystem))?;
    let dst_manifest = cfg.deployed_manifest();
    if !read_current(fs, &dst_manifest, dry_run)?.matches(&manifest) {
        changes.push(format!("install {}", dst_manifest.display()));
        if !dry_run {
            fs.write_atomic(&dst_manifest, &manifest, MANIFEST_MODE)
                .map_err(fail_as(ProvisionError::Filesystem))?;
        }
    }
    Ok(())
}

fn seed_config(
    fs: &impl HostFs,
    reporter: &impl ProgressReporter,
    cfg: &SetupConfig,
    state: &mut ProvisionState,
    src_template: &Path,
    opts: &DeployOptions<'_>,
    changes: &mut Changes,
) -> Result<()> {
    let template = fs
        .read(src_template)
        .map_err(fail_as(ProvisionError::Filesystem))?;
    let text = String::from_utf8_lossy(&template);
    AgentSettings::parse(&text).map_err(|e| {
        ProvisionError::Filesystem(format!(
            "template {} is not valid agent settings: {e}",
            src_template.display()
        ))
    })?;

    let live: PathBuf = cfg.env_file();
    let template_sha = sha256_hex(&template);
    let installed_sha = match read_current(fs, &live, opts.dry_run)? {
        Current::Absent => None,
        Current::Present(bytes) => Some(sha256_hex(&bytes)),
        Current::Unreadable => {
            changes.push(format!("(re)seed {} (unreadable to this user)", live.display()));
            return Ok(());
        }
    };

    let reason = match (opts.force_config, state.seed_status(installed_sha.as_deref())) {
        (true, _) => "reseed (forced)",
        (false, SeedStatus::Missing) => "seed",
        (false, SeedStatus::Pristine) if installed_sha.as_deref() != Some(template_sha.as_str()) => {
            "reseed from changed template"
        }
        (false, SeedStatus::Pristine) => return Ok(()),
        (false, SeedStatus::Customized) => {
            if installed_sha.as_deref() == Some(template_sha.as_str()) {
                // Matches the template but was never recorded.
                state.seeded_config_sha256 = Some(template_sha);
            } else {
                reporter.warn(&format!(
                    "{} was customized; keeping it (use --force to reseed)",
                    live.display()
                ));
                tracing::warn!(path = %live.display(), "preserving customized configuration");
            }
            return Ok(());
        }
    };

    changes.push(format!("{reason} {}", live.display()));
    if !opts.dry_run {
        fs.write_atomic(&live, &template, SECRET_MODE)
            .map_err(fail_as(ProvisionError::Filesystem))?;
        state.seeded_config_sha256 = Some(template_sha);
    }
    Ok(())
}
