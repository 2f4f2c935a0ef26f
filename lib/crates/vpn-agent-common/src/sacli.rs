//! The administrative `sacli` sub-commands the agent is allowed to run.
//!
//! Each sub-command carries the exact argument shape the agent uses, with
//! `*` in the positions that vary per request (user name, property, value).
//! The host setup tool turns these shapes into sudoers rules, so the agent
//! and the grant can never drift apart.

use serde::{Deserialize, Serialize};

/// Default install location of `sacli` on OpenVPN Access Server hosts.
pub const DEFAULT_SACLI_PATH: &str = "/usr/local/openvpn_as/scripts/sacli";

/// Wildcard token matching any single argument value.
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SacliCommand {
    /// Set a named property for a named user (`type user_connect`).
    UserPropPut,
    /// Set the local password of a named user.
    SetLocalPassword,
    /// Issue a profile import token for a named user.
    AddProfileToken,
    /// Fetch the connection profile of a named user.
    GetUserlogin,
}

impl SacliCommand {
    /// Every delegated sub-command, in grant order.
    pub const ALL: [SacliCommand; 4] = [
        SacliCommand::UserPropPut,
        SacliCommand::SetLocalPassword,
        SacliCommand::AddProfileToken,
        SacliCommand::GetUserlogin,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SacliCommand::UserPropPut => "UserPropPut",
            SacliCommand::SetLocalPassword => "SetLocalPassword",
            SacliCommand::AddProfileToken => "AddProfileToken",
            SacliCommand::GetUserlogin => "GetUserlogin",
        }
    }

    /// Argument shape with positional wildcards.
    #[must_use]
    pub fn argument_pattern(self) -> &'static [&'static str] {
        match self {
            SacliCommand::UserPropPut => &["--user", WILDCARD, "UserPropPut", WILDCARD, WILDCARD],
            SacliCommand::SetLocalPassword => &[
                "--user",
                WILDCARD,
                "--new_pass",
                WILDCARD,
                "SetLocalPassword",
            ],
            SacliCommand::AddProfileToken => &["--user", WILDCARD, "AddProfileToken"],
            SacliCommand::GetUserlogin => &["--user", WILDCARD, "GetUserlogin"],
        }
    }

    /// Build the argument vector the agent passes to `sacli`.
    ///
    /// `values` fill the wildcard positions in order; missing values are
    /// left empty and extra values are ignored.
    #[must_use]
    pub fn arguments(self, values: &[&str]) -> Vec<String> {
        let mut values = values.iter();
        self.argument_pattern()
            .iter()
            .map(|token| {
                if *token == WILDCARD {
                    values.next().map_or_else(String::new, |v| (*v).to_string())
                } else {
                    (*token).to_string()
                }
            })
            .collect()
    }

    /// Look up a sub-command by its `sacli` name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl std::fmt::Display for SacliCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
