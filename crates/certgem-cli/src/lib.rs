//! CertGem CLI library
//!
//! Tooling around the E2E suite: writing the authentication snapshot,
//! a one-shot smoke check and printing the effective configuration.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;

pub use commands::{Cli, Commands, ConfigArgs, ConfigFormat, SetupArgs, SmokeArgs};
pub use config::Verbosity;
pub use error::{CliError, CliResult};
