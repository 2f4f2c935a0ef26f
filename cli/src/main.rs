//! vpn-agent-setup - idempotent host provisioning for the VPN provisioning agent

use clap::Parser;
use vpn_agent_setup::cli::Cli;
use vpn_agent_setup::domain::{ConfigError, ProvisionError};
use vpn_agent_setup::{logging, output};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.global.verbose);
    let json = cli.global.json;

    if let Err(e) = cli.run().await {
        let kind = e.downcast_ref::<ProvisionError>();
        let code = match kind {
            Some(k) => k.code(),
            None if e.downcast_ref::<ConfigError>().is_some() => "CONFIG",
            None => "ERROR",
        };
        tracing::debug!(error = ?e, code, "command failed");
        match output::json::format_error(&format!("{e:#}"), code) {
            Ok(doc) if json => println!("{doc}"),
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(kind.map_or(1, ProvisionError::exit_code));
    }
}
