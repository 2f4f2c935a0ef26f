//! Real-host implementations of the application ports.
//!
//! This module contains all I/O-performing code: process execution,
//! filesystem access, identity lookups, state persistence and the health
//! probe.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod config;
pub mod fs;
pub mod health;
pub mod identity;
pub mod state;
