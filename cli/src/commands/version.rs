//! `vpn-agent-setup version`

use anyhow::Result;

use crate::output::json;

/// # Errors
///
/// Returns an error if the JSON document cannot be serialized.
pub fn run(as_json: bool) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    if as_json {
        return json::print(&serde_json::json!({ "version": version }));
    }
    println!("{} {version}", env!("CARGO_PKG_NAME"));
    Ok(())
}
