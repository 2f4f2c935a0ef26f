//! Pure provisioning types: configuration, grant, unit, state and step outcomes.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod grant;
pub mod state;
pub mod step;
pub mod unit;

pub use config::{SetupConfig, validate_account_name};
pub use error::{CommandFailed, CommandTimeout, ConfigError, ProvisionError};
pub use grant::{GrantRule, PrivilegeGrant};
pub use state::{ProvisionState, SeedStatus};
pub use step::{ProvisionReport, StepId, StepOutcome};
pub use unit::ServiceUnit;
