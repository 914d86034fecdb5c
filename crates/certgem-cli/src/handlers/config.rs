//! Config command handler

use crate::commands::{ConfigArgs, ConfigFormat};
use crate::error::{CliError, CliResult};
use certgem_e2e::SuiteConfig;

/// Print the effective configuration
pub fn execute_config(config: &SuiteConfig, args: &ConfigArgs) -> CliResult<()> {
    print!("{}", render_config(config, args.format)?);
    Ok(())
}

/// Render `config` in `format`, newline-terminated
pub fn render_config(config: &SuiteConfig, format: ConfigFormat) -> CliResult<String> {
    match format {
        ConfigFormat::Yaml => Ok(config.to_yaml()?),
        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map(|json| json + "\n")
            .map_err(|e| CliError::config(format!("cannot render JSON: {e}"))),
    }
}
