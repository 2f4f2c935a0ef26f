//! Self-signed TLS key pair for the agent's HTTPS listener.

use anyhow::Result;

use crate::application::ports::{CommandRunner, HostFs};
use crate::application::services::exec::run_checked;
use crate::application::services::steps::fail_as;
use crate::domain::config::SetupConfig;
use crate::domain::{ProvisionError, StepOutcome};

const KEY_MODE: u32 = 0o600;
const SECONDS_PER_DAY: u64 = 86_400;
const SUBJECT_ALT_NAME: &str = "subjectAltName=DNS:localhost,IP:127.0.0.1";

/// Ensure `key.pem` and `cert.pem` exist and the certificate is not about
/// to expire. `force` regenerates a valid pair.
///
/// # Errors
///
/// Returns `ProvisionError::SecretGeneration` if openssl fails or the key
/// cannot be narrowed to `0600`.
pub async fn ensure(
    runner: &impl CommandRunner,
    fs: &impl HostFs,
    cfg: &SetupConfig,
    force: bool,
    dry_run: bool,
) -> Result<StepOutcome> {
    let key = cfg.key_file();
    let cert = cfg.cert_file();
    let cert_arg = cert.to_string_lossy().into_owned();

    let reason = if !fs.exists(&key) || !fs.exists(&cert) {
        "generate"
    } else if force {
        "regenerate (forced)"
    } else if expires_within(runner, &cert_arg, cfg.tls.renew_within_days).await? {
        "renew expiring"
    } else {
        return Ok(StepOutcome::AlreadySatisfied(format!(
            "key pair valid for more than {} day(s)",
            cfg.tls.renew_within_days
        )));
    };

    let summary = format!(
        "{reason} RSA-{} key pair for CN={}",
        cfg.tls.key_bits, cfg.tls.common_name
    );
    if dry_run {
        return Ok(StepOutcome::Planned(summary));
    }

    let key_arg = key.to_string_lossy().into_owned();
    let newkey = format!("rsa:{}", cfg.tls.key_bits);
    let days = cfg.tls.validity_days.to_string();
    let subject = format!("/CN={}", cfg.tls.common_name);
    run_checked(
        runner,
        "openssl",
        &[
            "req",
            "-x509",
            "-newkey",
            newkey.as_str(),
            "-sha256",
            "-nodes",
            "-keyout",
            key_arg.as_str(),
            "-out",
            cert_arg.as_str(),
            "-days",
            days.as_str(),
            "-subj",
            subject.as_str(),
            "-addext",
            SUBJECT_ALT_NAME,
        ],
    )
    .await
    .map_err(fail_as(ProvisionError::SecretGeneration))?;

    if !fs.exists(&key) || !fs.exists(&cert) {
        return Err(ProvisionError::SecretGeneration(
            "openssl reported success but the key pair is missing".to_string(),
        )
        .into());
    }
    fs.set_mode(&key, KEY_MODE)
        .map_err(fail_as(ProvisionError::SecretGeneration))?;

    tracing::info!(cert = %cert.display(), "generated TLS key pair");
    Ok(StepOutcome::Created(summary))
}

/// Whether the certificate expires within `days`. Only a non-zero exit of
/// `openssl x509 -checkend` counts as expiring.
async fn expires_within(runner: &impl CommandRunner, cert: &str, days: u32) -> Result<bool> {
    let seconds = (u64::from(days) * SECONDS_PER_DAY).to_string();
    let output = runner
        .run(
            "openssl",
            &["x509", "-checkend", seconds.as_str(), "-noout", "-in", cert],
        )
        .await
        .map_err(fail_as(ProvisionError::SecretGeneration))?;
    Ok(!output.status.success())
}
