//! Setup command handler: log in once and save the authentication snapshot

use crate::commands::SetupArgs;
use crate::config::Verbosity;
use crate::error::CliResult;
use certgem_e2e::SuiteConfig;

/// Log in with the account from `CERTGEM_EMAIL`/`CERTGEM_PASSWORD` and write
/// the snapshot to `--output` or the configured `auth_state_path`
#[cfg(feature = "browser")]
pub fn execute_setup(
    mut config: SuiteConfig,
    args: &SetupArgs,
    verbosity: Verbosity,
) -> CliResult<()> {
    use crate::error::CliError;
    use certgem_e2e::{AuthSnapshot, CdpBrowser, Credentials, LoginPage};
    use console::style;
    use std::sync::Arc;

    if let Some(output) = &args.output {
        config.auth_state_path.clone_from(output);
    }
    let credentials = Credentials::from_env()?;
    let snapshot = AuthSnapshot::new(&config.auth_state_path);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::config(format!("Failed to create runtime: {e}")))?;
    rt.block_on(async {
        let browser = CdpBrowser::launch(&config).await?;
        let page = LoginPage::new(Arc::new(browser.new_page().await?), config.clone());
        let flow = async {
            page.navigate().await?;
            page.login(&credentials.email, &credentials.password).await?;
            page.wait_for_url(&page.welcome_url(), None).await?;
            page.save_auth_state(&snapshot).await
        };
        let result = flow.await;
        if let Err(error) = browser.close().await {
            tracing::warn!(%error, "browser did not close cleanly");
        }
        result
    })?;

    if verbosity.is_quiet() {
        return Ok(());
    }
    println!(
        "{} auth snapshot written to {}",
        style("✓").green().bold(),
        snapshot.path().display()
    );
    Ok(())
}

/// Without chromium support there is nothing to log in with
#[cfg(not(feature = "browser"))]
pub fn execute_setup(
    _config: SuiteConfig,
    _args: &SetupArgs,
    _verbosity: Verbosity,
) -> CliResult<()> {
    Err(crate::error::CliError::feature_disabled("setup", "browser"))
}

#[cfg(all(test, not(feature = "browser")))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CliError;

    #[test]
    fn test_setup_needs_browser_feature() {
        let err = execute_setup(SuiteConfig::default(), &SetupArgs::default(), Verbosity::Normal)
            .unwrap_err();
        assert!(matches!(err, CliError::FeatureDisabled { .. }));
    }
}
