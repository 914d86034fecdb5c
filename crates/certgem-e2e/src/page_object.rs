//! Page Object Model support.
//!
//! A page object owns a driver handle, the suite configuration and a fixed
//! set of locators built in its constructor. [`BasePage`] carries the action
//! layer every screen shares: visibility-gated clicks, self-verifying fills
//! and load-state waits.

use crate::assertion::{expect, expect_page, Expect, PageExpect};
use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::locator::Locator;
use crate::network::UrlPattern;
use crate::result::SuiteResult;
use crate::wait::{poll_until, wait_timeout, LoadState, WaitOptions};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Trait for page objects representing one screen of the portal.
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Shared driver and configuration
    fn base(&self) -> &BasePage;

    /// Absolute URL the page is opened at
    fn url(&self) -> String;

    /// Pattern the browser URL matches while this page is shown
    fn url_pattern(&self) -> UrlPattern;

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &'static str;

    /// Navigate to [`PageObject::url`]
    async fn open(&self) -> SuiteResult<()> {
        tracing::info!(page = self.page_name(), "opening page");
        self.base().navigate(&self.url()).await
    }

    /// Whether the browser currently shows this page
    async fn is_loaded(&self) -> SuiteResult<bool> {
        let url = self.base().driver().current_url().await?;
        Ok(self.url_pattern().matches(&url))
    }
}

/// Driver handle plus the action layer shared by every page object
#[derive(Clone)]
pub struct BasePage {
    driver: Arc<dyn PageDriver>,
    config: SuiteConfig,
}

impl std::fmt::Debug for BasePage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasePage")
            .field("driver", &self.driver.name())
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

impl BasePage {
    /// Bind a driver and configuration
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>, config: SuiteConfig) -> Self {
        Self { driver, config }
    }

    /// The page driver
    #[must_use]
    pub fn driver(&self) -> &dyn PageDriver {
        self.driver.as_ref()
    }

    /// Shared handle to the driver
    #[must_use]
    pub fn driver_handle(&self) -> Arc<dyn PageDriver> {
        Arc::clone(&self.driver)
    }

    /// Suite configuration
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Absolute URL of an application route
    #[must_use]
    pub fn url(&self, route: &str) -> String {
        self.config.url(route)
    }

    /// Expectation on `locator` with the configured expect timeout
    #[must_use]
    pub fn expect(&self, locator: &Locator) -> Expect<'_> {
        expect(self.driver(), locator)
            .with_timeout(locator.timeout_or(self.config.expect_timeout()))
    }

    /// Page-level expectation with the configured expect timeout
    #[must_use]
    pub fn expect_page(&self) -> PageExpect<'_> {
        expect_page(self.driver()).with_timeout(self.config.expect_timeout())
    }

    /// Load `url`
    pub async fn navigate(&self, url: &str) -> SuiteResult<()> {
        tracing::debug!(%url, "navigate");
        self.driver.goto(url).await
    }

    /// Wait until `locator` is visible within the action timeout
    pub async fn wait_visible(&self, locator: &Locator) -> SuiteResult<()> {
        self.wait_visible_within(locator, locator.timeout_or(self.config.action_timeout()))
            .await
    }

    /// Wait until `locator` is visible within `timeout`
    pub async fn wait_visible_within(&self, locator: &Locator, timeout: Duration) -> SuiteResult<()> {
        let driver = self.driver();
        poll_until(
            WaitOptions::within(timeout),
            &format!("{locator} to be visible"),
            || driver.is_visible(locator),
        )
        .await
        .map(|_| ())
    }

    /// Wait until `locator` is absent or hidden within `timeout`
    pub async fn wait_hidden(&self, locator: &Locator, timeout: Duration) -> SuiteResult<()> {
        let driver = self.driver();
        poll_until(
            WaitOptions::within(timeout),
            &format!("{locator} to be hidden"),
            || async move { Ok(!driver.is_visible(locator).await?) },
        )
        .await
        .map(|_| ())
    }

    /// Wait until at least one element matches `locator` within `timeout`
    pub async fn wait_attached(&self, locator: &Locator, timeout: Duration) -> SuiteResult<()> {
        let driver = self.driver();
        poll_until(
            WaitOptions::within(timeout),
            &format!("{locator} to be attached"),
            || async move { Ok(driver.count(locator).await? > 0) },
        )
        .await
        .map(|_| ())
    }

    /// Wait for visibility, then click
    pub async fn click(&self, locator: &Locator) -> SuiteResult<()> {
        self.wait_visible(locator).await?;
        tracing::debug!(%locator, "click");
        self.driver.click(locator).await
    }

    /// Wait for visibility, then focus
    pub async fn focus(&self, locator: &Locator) -> SuiteResult<()> {
        self.wait_visible(locator).await?;
        self.driver.focus(locator).await
    }

    /// Wait for visibility, click, fill, then confirm the field holds `value`.
    ///
    /// Filling the same value twice leaves the field unchanged.
    pub async fn fill_field(&self, locator: &Locator, value: &str) -> SuiteResult<()> {
        self.wait_visible(locator).await?;
        self.driver.click(locator).await?;
        self.driver.fill(locator, value).await?;
        tracing::debug!(%locator, len = value.chars().count(), "fill");
        self.expect(locator).to_have_value(value).await
    }

    /// Press a key on the focused element
    pub async fn press(&self, key: &str) -> SuiteResult<()> {
        self.driver.press(key).await
    }

    /// DOM content loaded, then network idle
    pub async fn wait_for_load(&self) -> SuiteResult<()> {
        let timeout = self.config.test_timeout();
        self.driver
            .wait_for_load_state(LoadState::DomContentLoaded, timeout)
            .await?;
        self.driver
            .wait_for_load_state(LoadState::NetworkIdle, timeout)
            .await
    }

    /// Wait until the URL matches `pattern`
    pub async fn wait_for_url(&self, pattern: &UrlPattern, timeout: Duration) -> SuiteResult<()> {
        let driver = self.driver();
        poll_until(
            WaitOptions::within(timeout),
            &format!("URL {pattern}"),
            || async move { Ok(pattern.matches(&driver.current_url().await?)) },
        )
        .await
        .map(|_| ())
    }

    /// URL once the page has settled
    pub async fn settled_url(&self) -> SuiteResult<String> {
        self.wait_for_load().await?;
        self.driver.current_url().await
    }

    /// Fixed pause
    pub async fn pause(&self, ms: u64) {
        wait_timeout(ms).await;
    }
}
