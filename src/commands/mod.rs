//! CLI command handlers
//!
//! One module per `vscch` subcommand; `main.rs` only parses arguments and
//! dispatches here.

pub mod configure;
pub mod remove_scripts;
pub mod toolchains;
