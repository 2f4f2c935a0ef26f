//! systemd unit descriptor for the agent.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::domain::config::SetupConfig;

/// Supervised-process descriptor registered with systemd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUnit {
    pub description: String,
    pub user: String,
    pub working_directory: PathBuf,
    pub environment_file: PathBuf,
    pub exec_start: String,
    pub restart: String,
    pub restart_sec: u32,
}

impl ServiceUnit {
    #[must_use]
    pub fn from_config(cfg: &SetupConfig) -> Self {
        Self {
            description: cfg.service.description.clone(),
            user: cfg.account.name.clone(),
            working_directory: cfg.paths.app_root.clone(),
            environment_file: cfg.env_file(),
            exec_start: format!("{} -m {}", cfg.venv_python().display(), cfg.service.module),
            restart: cfg.service.restart.clone(),
            restart_sec: cfg.service.restart_sec,
        }
    }

    /// Render as a unit file. The `[Install]` section lets the operator
    /// enable the unit; provisioning never does.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Managed by vpn-agent-setup.");
        let _ = writeln!(out, "[Unit]");
        let _ = writeln!(out, "Description={}", self.description);
        let _ = writeln!(out, "After=network-online.target");
        let _ = writeln!(out, "Wants=network-online.target");
        let _ = writeln!(out);
        let _ = writeln!(out, "[Service]");
        let _ = writeln!(out, "Type=simple");
        let _ = writeln!(out, "User={}", self.user);
        let _ = writeln!(out, "Group={}", self.user);
        let _ = writeln!(out, "WorkingDirectory={}", self.working_directory.display());
        let _ = writeln!(out, "EnvironmentFile={}", self.environment_file.display());
        let _ = writeln!(out, "ExecStart={}", self.exec_start);
        let _ = writeln!(out, "Restart={}", self.restart);
        let _ = writeln!(out, "RestartSec={}", self.restart_sec);
        let _ = writeln!(out);
        let _ = writeln!(out, "[Install]");
        let _ = writeln!(out, "WantedBy=multi-user.target");
        out
    }
}
