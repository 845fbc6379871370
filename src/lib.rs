/*!
 * jujulib - Juju controller API client
 *
 * The protocol lives in two workspace crates:
 * - `jujulib-wire`: request/response envelopes, facade versions, typed calls, tags
 * - `jujulib-connect`: WebSocket transport, request dispatcher, login and model operations
 *
 * This crate adds what the `jujuctl` binary needs on top: a config file,
 * logging setup, exit codes and table/JSON output.
 */

pub mod cli_style;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

// Re-export commonly used types
pub use config::{ClientConfig, LogLevel};
pub use error::{CliError, Result};
pub use jujulib_connect::{ControllerApi, Credentials};
pub use output::OutputWriter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
