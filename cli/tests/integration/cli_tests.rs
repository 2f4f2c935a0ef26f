//! Integration tests for the vpn-agent-setup command line
//!
//! These tests run the real binary. Nothing here changes the host: they
//! stick to read-only commands and configurations rooted in temp dirs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn setup() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vpn-agent-setup"));
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("VPN_AGENT_SETUP_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// A configuration whose paths all live under `dir`.
fn write_config(dir: &Path, account: &str) -> PathBuf {
    let root = dir.display();
    let yaml = format!(
        "account:\n  name: {account}\n  home: {root}/home\n\
         paths:\n  app_root: {root}/opt/vpn-agent\n  config_root: {root}/etc/vpn-agent\n  \
         state_dir: {root}/state\n  sudoers_file: {root}/sudoers.d/vpn-agent\n  \
         unit_file: {root}/systemd/vpn-agent.service\n"
    );
    let path = dir.join("setup.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

fn absent_config(dir: &TempDir) -> PathBuf {
    dir.path().join("absent.yaml")
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    setup().assert().code(2).stderr(predicate::str::contains(
        "Idempotent host provisioning for the VPN provisioning agent",
    ));
}

#[test]
fn test_help_lists_commands() {
    setup()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("provision"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("grant"));
}

#[test]
fn test_provision_help_lists_flags() {
    setup()
        .args(["provision", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--force-secrets"))
        .stdout(predicate::str::contains("--source"));
}

#[test]
fn test_version_command_shows_version() {
    setup()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!(
            "vpn-agent-setup ",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = setup().args(["version", "--json"]).output().unwrap();
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(doc["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_no_color_env_accepts_any_value() {
    for value in ["1", "yes", "true", ""] {
        setup()
            .env("NO_COLOR", value)
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains("vpn-agent-setup "));
    }
}

#[test]
fn test_unknown_command_exits_with_error() {
    setup().arg("nonexistent").assert().failure();
}

// --- Grant preview ---

#[test]
fn test_grant_prints_four_scoped_rules() {
    let dir = TempDir::new().unwrap();
    let output = setup()
        .args(["grant", "--config"])
        .arg(absent_config(&dir))
        .output()
        .unwrap();

    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    let rules: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(rules.len(), 4, "{text}");
    for (rule, sub) in rules.iter().zip([
        "UserPropPut",
        "SetLocalPassword",
        "AddProfileToken",
        "GetUserlogin",
    ]) {
        assert!(rule.starts_with("vpn-agent ALL=(ALL) NOPASSWD: /usr/local/openvpn_as/scripts/sacli --user * "));
        assert!(rule.contains(sub), "{rule}");
    }
}

#[test]
fn test_grant_uses_configured_account() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "openvpn-bot");
    setup()
        .args(["grant", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("openvpn-bot ALL=(ALL) NOPASSWD:"));
}

#[test]
fn test_grant_json_lists_rules() {
    let dir = TempDir::new().unwrap();
    let output = setup()
        .args(["--json", "grant", "--config"])
        .arg(absent_config(&dir))
        .output()
        .unwrap();

    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(doc["path"], "/etc/sudoers.d/vpn-agent");
    assert_eq!(doc["rules"].as_array().map(Vec::len), Some(4));
    assert_eq!(doc["rules"][2]["arguments"][2], "AddProfileToken");
}

#[test]
fn test_config_env_var_is_honoured() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "from-env");
    setup()
        .env("VPN_AGENT_SETUP_CONFIG", &config)
        .arg("grant")
        .assert()
        .success()
        .stdout(predicate::str::contains("from-env ALL="));
}

// --- Configuration errors ---

#[test]
fn test_invalid_account_name_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "Bad Name");
    setup()
        .args(["grant", "--config"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid account name"));
}

#[test]
fn test_invalid_config_json_error_has_config_code() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("setup.yaml");
    std::fs::write(&config, "paths:\n  app_root: relative/path\n").unwrap();

    let output = setup()
        .args(["--json", "grant", "--config"])
        .arg(&config)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(doc["error"], true);
    assert_eq!(doc["code"], "CONFIG");
}

#[test]
fn test_unparseable_config_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("setup.yaml");
    std::fs::write(&config, "account: [not, a, map]\n").unwrap();
    setup()
        .args(["grant", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot parse"));
}

// --- Verify ---

#[test]
fn test_verify_on_unprovisioned_paths_reports_unhealthy() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "vpn-agent-absent");

    let output = setup()
        .args(["--json", "verify", "--config"])
        .arg(&config)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    // The report is printed before the failure is returned.
    let report: serde_json::Value = serde_json::Deserializer::from_str(&stdout)
        .into_iter::<serde_json::Value>()
        .next()
        .expect("report document")
        .expect("valid JSON");
    assert_eq!(report["status"], "unhealthy");
    assert!(report["findings"].as_array().is_some_and(|f| !f.is_empty()));
    assert!(dir.path().read_dir().unwrap().count() == 1, "verify must not create files");
}

#[test]
fn test_verify_human_output_names_failed_checks() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "vpn-agent-absent");
    setup()
        .args(["verify", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stdout(predicate::str::contains("check(s) failed."))
        .stderr(predicate::str::contains("privilege grant"))
        .stderr(predicate::str::contains("verification check(s) failed"));
}

// --- Provision ---

#[test]
fn test_provision_as_non_root_exits_noperm() {
    if nix::unistd::geteuid().is_root() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "vpn-agent");
    setup()
        .args(["provision", "--source"])
        .arg(dir.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .code(77)
        .stderr(predicate::str::contains("Root privileges required"));
    assert!(!dir.path().join("opt").exists());
}

#[test]
fn test_provision_json_error_has_privilege_code() {
    if nix::unistd::geteuid().is_root() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "vpn-agent");
    let output = setup()
        .args(["--json", "provision", "--config"])
        .arg(&config)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(77));
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(doc["code"], "PRIVILEGE");
}

#[test]
fn test_force_secrets_as_non_root_refuses_without_prompting() {
    if nix::unistd::geteuid().is_root() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "vpn-agent");
    let config_root = dir.path().join("etc/vpn-agent");
    std::fs::create_dir_all(&config_root).unwrap();
    std::fs::write(config_root.join("key.pem"), "existing key").unwrap();

    setup()
        .env_remove("CI")
        .args(["provision", "--force-secrets", "--config"])
        .arg(&config)
        .assert()
        .code(77)
        .stderr(predicate::str::contains("Regenerate").not())
        .stderr(predicate::str::contains("Root privileges required"));
}
