//! Use cases built on the ports.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod exec;
pub mod pipeline;
pub mod steps;
pub mod verify;
