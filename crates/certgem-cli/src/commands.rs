//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CertGem E2E suite tooling
#[derive(Parser, Debug)]
#[command(name = "certgem")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ./certgem.yaml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with the QA account and save the authentication snapshot
    Setup(SetupArgs),

    /// Open the portal home page and check its title
    Smoke(SmokeArgs),

    /// Print the effective configuration
    Config(ConfigArgs),
}

/// Arguments for `setup`
#[derive(Args, Debug, Default)]
pub struct SetupArgs {
    /// Write the snapshot here instead of `auth_state_path`
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for `smoke`
#[derive(Args, Debug)]
pub struct SmokeArgs {
    /// Override the portal origin
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Regex the document title must match
    #[arg(long, default_value = "CertGem")]
    pub title: String,
}

/// Arguments for `config`
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = ConfigFormat::Yaml)]
    pub format: ConfigFormat,
}

/// Rendering of `certgem config`
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML, the config file's own format
    #[default]
    Yaml,
    /// Pretty JSON
    Json,
}
