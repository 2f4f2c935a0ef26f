//! `vpn-agent-setup grant`: preview the sudoers grant.

use anyhow::Result;

use crate::app::AppContext;
use crate::domain::PrivilegeGrant;
use crate::output::json;

/// Print the grant provisioning would install, after the same scoping check.
///
/// # Errors
///
/// Returns a validation error if the configured account or `sacli` path
/// yields a grant broader than the four delegated sub-commands.
pub fn run(ctx: &AppContext) -> Result<()> {
    let cfg = &ctx.config;
    let grant = PrivilegeGrant::for_account(&cfg.account.name, &cfg.sacli_path);
    grant.validate_scoping(&cfg.account.name)?;

    if ctx.is_json() {
        let rules: Vec<_> = grant
            .rules
            .iter()
            .map(|r| {
                serde_json::json!({
                    "principal": r.principal,
                    "run_as": r.run_as,
                    "command": r.command,
                    "arguments": r.argument_pattern,
                })
            })
            .collect();
        return json::print(&serde_json::json!({
            "path": cfg.paths.sudoers_file,
            "rules": rules,
        }));
    }
    // The grant text is the payload, so quiet does not suppress it.
    print!("{}", grant.render());
    Ok(())
}
