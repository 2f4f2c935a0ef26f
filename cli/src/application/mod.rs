//! Provisioning steps and audits, written against the port traits so they
//! run the same on a real host and on the test doubles.

pub mod ports;
pub mod services;

pub use ports::{
    CommandRunner, HealthProbe, HostFs, HostIdentity, ProgressReporter, ProvisionStateStore,
    ServiceAccount,
};
