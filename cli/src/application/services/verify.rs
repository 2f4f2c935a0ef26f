//! Read-only audit of a provisioned host.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use serde::Serialize;
use vpn_agent_common::{AgentSettings, HEALTH_PATH};

use crate::application::ports::{HealthProbe, HostFs, HostIdentity};
use crate::domain::config::SetupConfig;
use crate::domain::grant::RULE_COUNT;
use crate::domain::{PrivilegeGrant, ServiceUnit};

const GROUP_OTHER_BITS: u32 = 0o077;

/// One audited property of the end state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub check: &'static str,
    pub ok: bool,
    pub detail: String,
}

impl Finding {
    fn pass(check: &'static str, detail: impl Into<String>) -> Self {
        Self { check, ok: true, detail: detail.into() }
    }

    fn fail(check: &'static str, detail: impl Into<String>) -> Self {
        Self { check, ok: false, detail: detail.into() }
    }
}

/// All findings of one `verify` run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    pub findings: Vec<Finding>,
}

impl VerifyReport {
    #[must_use]
    pub fn healthy(&self) -> bool {
        self.findings.iter().all(|f| f.ok)
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.findings.iter().filter(|f| !f.ok).count()
    }
}

/// Audit the provisioned end state without changing it.
///
/// Unreadable files are reported as failed findings rather than errors.
///
/// # Errors
///
/// Returns an error only if the account lookup itself fails.
pub fn audit(fs: &impl HostFs, identity: &impl HostIdentity, cfg: &SetupConfig) -> Result<VerifyReport> {
    let name = cfg.account.name.as_str();
    let mut findings = Vec::new();

    let account = identity.lookup_account(name)?;
    findings.push(match &account {
        Some(a) => Finding::pass("account", format!("'{name}' exists (uid {})", a.uid)),
        None => Finding::fail("account", format!("'{name}' does not exist")),
    });

    for (check, root) in [("app root", &cfg.paths.app_root), ("config root", &cfg.paths.config_root)] {
        findings.push(match (fs.exists(root), &account) {
            (false, _) => Finding::fail(check, format!("{} is missing", root.display())),
            (true, Some(a)) if fs.owner(root).is_ok_and(|uid| uid != a.uid) => {
                Finding::fail(check, format!("{} is not owned by '{name}'", root.display()))
            }
            (true, _) => Finding::pass(check, root.display().to_string()),
        });
    }

    for (check, path) in [("configuration file", cfg.env_file()), ("private key", cfg.key_file())] {
        findings.push(match fs.mode(&path) {
            Ok(mode) if mode & GROUP_OTHER_BITS == 0 => {
                Finding::pass(check, format!("{} is {mode:04o}", path.display()))
            }
            Ok(mode) => Finding::fail(check, format!("{} is {mode:04o}; expected 0600", path.display())),
            Err(_) => Finding::fail(check, format!("{} is missing", path.display())),
        });
    }

    findings.push(if fs.exists(&cfg.cert_file()) {
        Finding::pass("certificate", cfg.cert_file().display().to_string())
    } else {
        Finding::fail("certificate", format!("{} is missing", cfg.cert_file().display()))
    });

    findings.push(audit_grant(fs, cfg));
    findings.push(audit_unit(fs, cfg));

    findings.push(if fs.exists(&cfg.venv_python()) {
        Finding::pass("runtime environment", cfg.venv_dir().display().to_string())
    } else {
        Finding::fail("runtime environment", format!("{} is missing", cfg.venv_python().display()))
    });

    Ok(VerifyReport { findings })
}

fn audit_grant(fs: &impl HostFs, cfg: &SetupConfig) -> Finding {
    const CHECK: &str = "privilege grant";
    let live = &cfg.paths.sudoers_file;
    let Ok(content) = fs.read(live) else {
        return Finding::fail(CHECK, format!("{} is missing or unreadable", live.display()));
    };
    let content = String::from_utf8_lossy(&content);
    let expected = PrivilegeGrant::for_account(&cfg.account.name, &cfg.sacli_path);
    match PrivilegeGrant::parse(&content) {
        Ok(grant) if grant == expected => match grant.validate_scoping(&cfg.account.name) {
            Ok(()) => Finding::pass(CHECK, format!("{RULE_COUNT} rules for '{}'", cfg.account.name)),
            Err(e) => Finding::fail(CHECK, e.to_string()),
        },
        Ok(grant) => Finding::fail(
            CHECK,
            format!("{} holds {} rule(s) that differ from the expected grant", live.display(), grant.rules.len()),
        ),
        Err(e) => Finding::fail(CHECK, e.to_string()),
    }
}

fn audit_unit(fs: &impl HostFs, cfg: &SetupConfig) -> Finding {
    const CHECK: &str = "service unit";
    let path = &cfg.paths.unit_file;
    match fs.read(path) {
        Ok(content) if content == ServiceUnit::from_config(cfg).render().as_bytes() => {
            Finding::pass(CHECK, format!("{} registered", path.display()))
        }
        Ok(_) => Finding::fail(CHECK, format!("{} differs from the rendered unit", path.display())),
        Err(_) => Finding::fail(CHECK, format!("{} is missing", path.display())),
    }
}

/// Call the agent's health endpoint with the seeded API key, trusting only
/// the provisioned certificate.
///
/// # Errors
///
/// Returns an error if the configuration file cannot be read or parsed.
/// Transport failures and non-200 answers are failed findings.
pub async fn check_health(fs: &impl HostFs, probe: &impl HealthProbe, cfg: &SetupConfig) -> Result<Finding> {
    const CHECK: &str = "health endpoint";
    let env = fs
        .read(&cfg.env_file())
        .with_context(|| format!("reading {}", cfg.env_file().display()))?;
    let settings = AgentSettings::parse(&String::from_utf8_lossy(&env))
        .with_context(|| format!("parsing {}", cfg.env_file().display()))?;

    let url = format!("https://127.0.0.1:{}{HEALTH_PATH}", settings.port);
    tracing::debug!(url = %url, "probing agent health");
    Ok(match probe.probe(&url, &settings.api_key, &cfg.cert_file()).await {
        Ok(200) => Finding::pass(CHECK, format!("{url} answered 200")),
        Ok(status) => Finding::fail(CHECK, format!("{url} answered {status}")),
        Err(e) => Finding::fail(CHECK, format!("{url}: {e:#}")),
    })
}
