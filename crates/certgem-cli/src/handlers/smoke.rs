//! Smoke command handler: is the portal up and serving the app?

use crate::commands::SmokeArgs;
use crate::config::Verbosity;
use crate::error::{CliError, CliResult};
use certgem_e2e::SuiteConfig;

/// Apply `--base-url` and reject an empty title pattern
pub fn smoke_config(mut config: SuiteConfig, args: &SmokeArgs) -> CliResult<SuiteConfig> {
    if args.title.trim().is_empty() {
        return Err(CliError::invalid_argument("--title must not be empty"));
    }
    if let Some(url) = &args.base_url {
        config.base_url = url.trim_end_matches('/').to_string();
        config.validate()?;
    }
    Ok(config)
}

/// Open the home page and check the document title
#[cfg(feature = "browser")]
pub fn execute_smoke(
    config: SuiteConfig,
    args: &SmokeArgs,
    verbosity: Verbosity,
) -> CliResult<()> {
    use certgem_e2e::{CdpBrowser, LoginPage};
    use console::style;
    use std::sync::Arc;

    let config = smoke_config(config, args)?;
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::config(format!("Failed to create runtime: {e}")))?;
    rt.block_on(async {
        let browser = CdpBrowser::launch(&config).await?;
        let page = LoginPage::new(Arc::new(browser.new_page().await?), config.clone());
        let result = async {
            page.navigate_home().await?;
            page.verify_title(&args.title).await
        }
        .await;
        if let Err(error) = browser.close().await {
            tracing::warn!(%error, "browser did not close cleanly");
        }
        result
    })?;

    if verbosity.is_quiet() {
        return Ok(());
    }
    println!(
        "{} {} is up, title matches /{}/",
        style("✓").green().bold(),
        config.base_url,
        args.title
    );
    Ok(())
}

/// Without chromium support there is no page to open
#[cfg(not(feature = "browser"))]
pub fn execute_smoke(
    config: SuiteConfig,
    args: &SmokeArgs,
    _verbosity: Verbosity,
) -> CliResult<()> {
    smoke_config(config, args)?;
    Err(CliError::feature_disabled("smoke", "browser"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(base_url: Option<&str>, title: &str) -> SmokeArgs {
        SmokeArgs {
            base_url: base_url.map(str::to_string),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_base_url_override_drops_trailing_slash() {
        let config = smoke_config(
            SuiteConfig::default(),
            &args(Some("https://certgem.example/"), "CertGem"),
        )
        .unwrap();
        assert_eq!(config.base_url, "https://certgem.example");
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        let err = smoke_config(SuiteConfig::default(), &args(Some("ftp://x"), "CertGem"));
        assert!(matches!(err, Err(CliError::Suite(_))));
    }

    #[cfg(not(feature = "browser"))]
    #[test]
    fn test_smoke_needs_browser_feature() {
        let err = execute_smoke(SuiteConfig::default(), &args(None, "CertGem"), Verbosity::Normal)
            .unwrap_err();
        assert!(matches!(err, CliError::FeatureDisabled { .. }));
    }

    #[test]
    fn test_empty_title_rejected() {
        let err = smoke_config(SuiteConfig::default(), &args(None, "  "));
        assert!(matches!(err, Err(CliError::InvalidArgument { .. })));
    }
}
