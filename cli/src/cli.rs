//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};

use crate::app::AppContext;
use crate::commands;
use crate::infra::config::CONFIG_ENV;

/// Flags accepted before or after any subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (any non-empty NO_COLOR also disables it)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Setup configuration file [default: /etc/vpn-agent-setup.yaml]
    #[arg(long, global = true, env = CONFIG_ENV, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip confirmation prompts (also set by the CI env var)
    #[arg(short, long, global = true)]
    pub yes: bool,
}

/// Idempotent host provisioning for the VPN provisioning agent
#[derive(Parser)]
#[command(
    name = "vpn-agent-setup",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision this host for the agent (requires root)
    Provision(commands::provision::ProvisionArgs),

    /// Audit the provisioned host without changing it
    Verify(commands::verify::VerifyArgs),

    /// Print the sudoers grant that provisioning installs
    Grant,

    /// Show version
    Version,
}

impl Cli {
    /// Load the configuration and dispatch to the chosen command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the command fails.
    pub async fn run(self) -> Result<()> {
        // Needs no configuration.
        if let Command::Version = self.command {
            return commands::version::run(self.global.json);
        }

        let ctx = AppContext::new(&self.global)?;
        match self.command {
            Command::Provision(args) => commands::provision::run(&ctx, args).await,
            Command::Verify(args) => commands::verify::run(&ctx, &args).await,
            Command::Grant => commands::grant::run(&ctx),
            Command::Version => Ok(()),
        }
    }
}
