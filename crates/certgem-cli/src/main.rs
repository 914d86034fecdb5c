//! `certgem`: CLI for the CertGem E2E suite

use certgem_cli::handlers::{execute_config, execute_setup, execute_smoke};
use certgem_cli::{Cli, CliResult, Commands, Verbosity};
use certgem_e2e::logging::{self, LogFormat};
use certgem_e2e::SuiteConfig;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    logging::init(verbosity.log_directive(), LogFormat::from_env());

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(base_url = %config.base_url, "configuration loaded");

    match cli.command {
        Commands::Setup(args) => execute_setup(config, &args, verbosity),
        Commands::Smoke(args) => execute_smoke(config, &args, verbosity),
        Commands::Config(args) => execute_config(&config, &args),
    }
}

/// `--config FILE` when given, else `./certgem.yaml` when present; env wins
fn load_config(path: Option<&Path>) -> CliResult<SuiteConfig> {
    let config = match path {
        Some(path) => SuiteConfig::from_file(path)?.with_env(|key| std::env::var(key).ok())?,
        None => SuiteConfig::load()?,
    };
    Ok(config)
}
