//! Gemologist lookup screen (`/buscar-gemologos`).

use crate::assertion::{assert_toast, ToastKind};
use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::locator::Locator;
use crate::network::{RouteRule, UrlPattern, GEMOLOGISTS_ENDPOINT};
use crate::page_object::{BasePage, PageObject};
use crate::result::{SuiteError, SuiteResult};
use std::sync::Arc;
use std::time::Duration;

/// Bound of each half of [`GemologistsPage::wait_for_load`]
pub const LOAD_TIMEOUT_MS: u64 = 10_000;

/// Success toast summary
pub const SUCCESS_SUMMARY: &str = "Sucesso";
/// Success toast detail
pub const SUCCESS_DETAIL: &str = "Gemólogos carregados com sucesso!";
/// Error toast summary
pub const ERROR_SUMMARY: &str = "Erro";
/// Error toast detail
pub const ERROR_DETAIL: &str = "Erro ao carregar a lista de gemólogos.";

/// Page object for the gemologist list
#[derive(Debug, Clone)]
pub struct GemologistsPage {
    base: BasePage,
    title: Locator,
    grid: Locator,
    cards: Locator,
    loading: Locator,
}

impl GemologistsPage {
    /// Page object over `driver`
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>, config: SuiteConfig) -> Self {
        Self {
            base: BasePage::new(driver, config),
            title: Locator::css("h1.title").with_text("Gemólogos Cadastrados"),
            grid: Locator::css(".gemologos-grid"),
            cards: Locator::css(".gemologo-card"),
            loading: Locator::css(".loading"),
        }
    }

    /// Page heading
    #[must_use]
    pub const fn title(&self) -> &Locator {
        &self.title
    }

    /// Card grid
    #[must_use]
    pub const fn grid(&self) -> &Locator {
        &self.grid
    }

    /// Gemologist cards
    #[must_use]
    pub const fn cards(&self) -> &Locator {
        &self.cards
    }

    /// Loading indicator
    #[must_use]
    pub const fn loading(&self) -> &Locator {
        &self.loading
    }

    /// Open the page
    pub async fn navigate(&self) -> SuiteResult<()> {
        self.open().await
    }

    /// Fail every request to the gemologist endpoint
    pub async fn abort_gemologists_api(&self) -> SuiteResult<()> {
        self.base
            .driver()
            .route(RouteRule::abort(GEMOLOGISTS_ENDPOINT))
            .await
    }

    /// Hold every request to the gemologist endpoint for `ms`
    pub async fn delay_gemologists_api(&self, ms: u64) -> SuiteResult<()> {
        self.base
            .driver()
            .route(RouteRule::delay(GEMOLOGISTS_ENDPOINT, ms))
            .await
    }

    /// Loading indicator gone, then the grid attached; 10s each
    pub async fn wait_for_load(&self) -> SuiteResult<()> {
        let timeout = Duration::from_millis(LOAD_TIMEOUT_MS);
        self.base.wait_hidden(&self.loading, timeout).await?;
        self.base.wait_attached(&self.grid, timeout).await
    }

    /// Number of cards
    pub async fn card_count(&self) -> SuiteResult<usize> {
        self.base.driver().count(&self.cards).await
    }

    /// Grid visible with at least one card
    pub async fn verify_loaded(&self) -> SuiteResult<()> {
        self.base.expect(&self.grid).to_be_visible().await?;
        let count = self.card_count().await?;
        if count == 0 {
            return Err(SuiteError::assertion("expected at least one gemologist card"));
        }
        Ok(())
    }

    /// Loading indicator shown or hidden
    pub async fn verify_loading_visible(&self, visible: bool) -> SuiteResult<()> {
        let expect = self.base.expect(&self.loading);
        if visible {
            expect.to_be_visible().await
        } else {
            expect.to_be_hidden().await
        }
    }

    /// Grid not rendered
    pub async fn verify_grid_hidden(&self) -> SuiteResult<()> {
        self.base.expect(&self.grid).to_be_hidden().await
    }

    /// "Sucesso" toast
    pub async fn verify_success_toast(&self) -> SuiteResult<()> {
        assert_toast(
            self.base.driver(),
            ToastKind::Success,
            SUCCESS_SUMMARY,
            SUCCESS_DETAIL,
        )
        .await
    }

    /// "Erro" toast
    pub async fn verify_error_toast(&self) -> SuiteResult<()> {
        assert_toast(self.base.driver(), ToastKind::Error, ERROR_SUMMARY, ERROR_DETAIL).await
    }
}

impl PageObject for GemologistsPage {
    fn base(&self) -> &BasePage {
        &self.base
    }

    fn url(&self) -> String {
        self.base.url("/buscar-gemologos")
    }

    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::Exact(self.url())
    }

    fn page_name(&self) -> &'static str {
        "gemologists"
    }
}
