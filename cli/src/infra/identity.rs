//! Host identity backed by libc through `nix`.

use anyhow::{Context, Result};
use nix::unistd::{User, geteuid};

use crate::application::ports::{HostIdentity, ServiceAccount};

/// Reads the effective uid and the passwd database of the running host.
pub struct NixIdentity;

impl HostIdentity for NixIdentity {
    fn effective_uid(&self) -> u32 {
        geteuid().as_raw()
    }

    fn lookup_account(&self, name: &str) -> Result<Option<ServiceAccount>> {
        let user = User::from_name(name).with_context(|| format!("looking up account '{name}'"))?;
        Ok(user.map(|u| ServiceAccount {
            name: u.name,
            uid: u.uid.as_raw(),
            home: u.dir,
            shell: u.shell,
        }))
    }
}
