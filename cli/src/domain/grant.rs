//! Privilege-delegation grant: the sudoers rules letting the service account
//! run the four delegated `sacli` sub-commands.
//!
//! Pure functions only. The grant is rendered and validated here; staging,
//! `visudo` checks and activation happen in the access-control step.

use std::fmt::Write as _;

use anyhow::Result;
use vpn_agent_common::SacliCommand;
use vpn_agent_common::sacli::WILDCARD;

use crate::domain::error::ProvisionError;

/// Number of rules a valid grant carries, one per delegated sub-command.
pub const RULE_COUNT: usize = SacliCommand::ALL.len();

/// Mode of the installed grant file.
pub const GRANT_MODE: u32 = 0o440;

const HEADER: &str = "# Managed by vpn-agent-setup. Re-run provisioning instead of editing.\n";

/// Characters with meaning in sudoers rule syntax.
const SUDOERS_SPECIAL: &[char] = &[',', ':', '=', '\\', '!', '(', ')', '#', '"', '\n'];

/// A single sudoers rule: `<principal> ALL=(<run_as>) NOPASSWD: <command> <args…>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRule {
    pub principal: String,
    pub run_as: String,
    pub command: String,
    pub argument_pattern: Vec<String>,
}

/// Ordered rule set installed as one sudoers include file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeGrant {
    pub rules: Vec<GrantRule>,
}

impl GrantRule {
    /// Rule for one delegated sub-command.
    #[must_use]
    pub fn for_command(principal: &str, sacli_path: &str, command: SacliCommand) -> Self {
        Self {
            principal: principal.to_string(),
            run_as: "ALL".to_string(),
            command: sacli_path.to_string(),
            argument_pattern: command
                .argument_pattern()
                .iter()
                .map(|t| (*t).to_string())
                .collect(),
        }
    }

    /// The sub-command this rule delegates, if it names exactly one.
    #[must_use]
    pub fn sub_command(&self) -> Option<SacliCommand> {
        let mut found = self
            .argument_pattern
            .iter()
            .filter_map(|t| SacliCommand::from_name(t));
        match (found.next(), found.next()) {
            (Some(cmd), None) => Some(cmd),
            _ => None,
        }
    }

    /// Whether this rule lets `principal` run `command` with `args`, under
    /// a model where a wildcard stands for exactly one argument.
    ///
    /// sudo is looser: its `*` is a glob over the joined argument string and
    /// also matches spaces, so `--user *` admits several words in that slot.
    /// Whatever this permits, sudo permits too; a `false` does not prove
    /// that sudo refuses.
    #[must_use]
    pub fn permits(&self, principal: &str, command: &str, args: &[&str]) -> bool {
        principal == self.principal
            && command == self.command
            && args.len() == self.argument_pattern.len()
            && self
                .argument_pattern
                .iter()
                .zip(args)
                .all(|(pattern, arg)| pattern == WILDCARD || pattern == arg)
    }

    fn render(&self) -> String {
        format!(
            "{} ALL=({}) NOPASSWD: {} {}",
            self.principal,
            self.run_as,
            self.command,
            self.argument_pattern.join(" ")
        )
    }

    fn parse(line: &str) -> Option<Self> {
        let (head, tail) = line.split_once("NOPASSWD:")?;
        let mut head = head.split_whitespace();
        let principal = head.next()?.to_string();
        let host_runas = head.next()?;
        if head.next().is_some() {
            return None;
        }
        let run_as = host_runas
            .split_once("=(")?
            .1
            .strip_suffix(')')?
            .to_string();
        let mut tail = tail.split_whitespace();
        let command = tail.next()?.to_string();
        Some(Self {
            principal,
            run_as,
            command,
            argument_pattern: tail.map(str::to_string).collect(),
        })
    }
}

impl PrivilegeGrant {
    /// The enumerated grant for `account`: one rule per delegated sub-command.
    #[must_use]
    pub fn for_account(account: &str, sacli_path: &str) -> Self {
        Self {
            rules: SacliCommand::ALL
                .into_iter()
                .map(|cmd| GrantRule::for_command(account, sacli_path, cmd))
                .collect(),
        }
    }

    /// Render the grant in sudoers syntax.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from(HEADER);
        for rule in &self.rules {
            let _ = writeln!(out, "{}", rule.render());
        }
        out
    }

    /// Parse the rule lines of an installed grant file. Comments and blank
    /// lines are skipped; unparseable lines are returned as `Err`.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error naming the first unparseable line.
    pub fn parse(content: &str) -> Result<Self> {
        let mut rules = Vec::new();
        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let rule = GrantRule::parse(line).ok_or_else(|| {
                ProvisionError::Validation(format!("unrecognised grant line: {line}"))
            })?;
            rules.push(rule);
        }
        Ok(Self { rules })
    }

    /// Whether any rule lets `principal` run `command args…`.
    #[must_use]
    pub fn permits(&self, principal: &str, command: &str, args: &[&str]) -> bool {
        self.rules
            .iter()
            .any(|r| r.permits(principal, command, args))
    }

    /// Check the grant delegates exactly the enumerated sub-commands to
    /// `account` and nothing broader.
    ///
    /// The check is structural: principal, run-as, command path and a fixed
    /// sub-command token per rule. It does not bound what sudo's `*` glob
    /// accepts in the user slot (see [`GrantRule::permits`]).
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error describing the first violation.
    pub fn validate_scoping(&self, account: &str) -> Result<()> {
        if self.rules.len() != RULE_COUNT {
            return Err(reject(format!(
                "expected {RULE_COUNT} rules, found {}",
                self.rules.len()
            )));
        }
        let mut seen = Vec::with_capacity(RULE_COUNT);
        for rule in &self.rules {
            if rule.principal != account {
                return Err(reject(format!(
                    "rule for '{}' does not name the service account '{account}'",
                    rule.principal
                )));
            }
            if !rule.command.starts_with('/') || rule.command == "ALL" {
                return Err(reject(format!(
                    "command '{}' must be an absolute path",
                    rule.command
                )));
            }
            let tokens = std::iter::once(&rule.command)
                .chain(&rule.argument_pattern)
                .chain(std::iter::once(&rule.run_as));
            for token in tokens {
                if token.is_empty() || token.contains(SUDOERS_SPECIAL) || token.contains(char::is_whitespace) {
                    return Err(reject(format!("unsafe token '{token}' in grant")));
                }
            }
            if rule.argument_pattern.iter().any(|t| t == "ALL") {
                return Err(reject("argument pattern may not contain ALL".to_string()));
            }
            if rule.argument_pattern.iter().all(|t| t == WILDCARD) {
                return Err(reject("argument pattern must not be all wildcards".to_string()));
            }
            let Some(cmd) = rule.sub_command() else {
                return Err(reject(format!(
                    "rule '{}' must name exactly one delegated sub-command",
                    rule.render()
                )));
            };
            if rule.argument_pattern != cmd.argument_pattern() {
                return Err(reject(format!("{cmd} argument pattern is broader than its shape")));
            }
            if seen.contains(&cmd) {
                return Err(reject(format!("{cmd} is delegated twice")));
            }
            seen.push(cmd);
        }
        Ok(())
    }
}

fn reject(msg: String) -> anyhow::Error {
    ProvisionError::Validation(msg).into()
}
