//! Provisioning pipeline behind the `vpn-agent-setup` binary.
//!
//! `domain` holds pure types, `application` the steps written against
//! ports, `infra` the real host, and `commands`/`output` the CLI surface.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod app;
pub mod application;
pub mod cli;
pub mod commands;
pub mod domain;
pub mod infra;
pub mod logging;
pub mod output;
