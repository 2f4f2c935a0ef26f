//! Command implementations

pub mod grant;
pub mod provision;
pub mod verify;
pub mod version;
