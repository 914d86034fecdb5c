//! Certificate listing, search, detail and creation screens.

use crate::config::SuiteConfig;
use crate::data::CertificateData;
use crate::driver::{PageDriver, Viewport};
use crate::locator::Locator;
use crate::network::UrlPattern;
use crate::page_object::{BasePage, PageObject};
use crate::result::{SuiteError, SuiteResult};
use crate::wait::{poll_until, WaitOptions};
use std::sync::Arc;

/// Input ids of the certificate form, in the order the form lays them out
pub const FORM_FIELD_IDS: [&str; 14] = [
    "gemName",
    "item",
    "color",
    "transparency",
    "clarity",
    "shape",
    "weight",
    "measurements",
    "species",
    "variety",
    "treatment",
    "origin",
    "comments",
    "observations",
];

/// Viewport the certificate flows run at
pub const FORM_VIEWPORT: Viewport = Viewport {
    width: 1280,
    height: 720,
};

/// Body markers of a not-found certificate
pub const NOT_FOUND_MARKERS: [&str; 3] = ["not found", "não encontrado", "404"];

const CERTIFICATE_URL: &str = r"/certificate(\?.*)?$";
const WELCOME_URL: &str = r"/welcome(\?.*)?$";

/// How the portal is expected to answer a certificate id it cannot show.
///
/// The portal's behaviour for deleted and unknown ids is not settled, so
/// callers state which answer they accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedOutcome {
    /// One of the markers becomes visible
    ErrorText(Vec<String>),
    /// The detail screen stays put with an empty form
    SoftEmpty,
    /// The browser ends up on this route
    Redirect(String),
}

impl ExpectedOutcome {
    /// Any of [`NOT_FOUND_MARKERS`]
    #[must_use]
    pub fn not_found() -> Self {
        Self::ErrorText(NOT_FOUND_MARKERS.iter().map(|m| (*m).to_string()).collect())
    }
}

/// Page object for `/welcome` (card list, search, create) and
/// `/certificate?id=<id>`
#[derive(Debug, Clone)]
pub struct CertificatesPage {
    base: BasePage,
    create_button: Locator,
    cards: Locator,
    save_button: Locator,
    search_input: Locator,
    form_fields: Vec<(&'static str, Locator)>,
}

impl CertificatesPage {
    /// Build the page's locators
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>, config: SuiteConfig) -> Self {
        Self {
            base: BasePage::new(driver, config),
            create_button: Locator::text("Criar Certificado"),
            cards: Locator::css("div.gemologo-card"),
            save_button: Locator::text("Salvar Certificado"),
            search_input: Locator::placeholder("Pesquisar"),
            form_fields: FORM_FIELD_IDS
                .iter()
                .map(|id| (*id, Locator::css(format!("#{id}"))))
                .collect(),
        }
    }

    /// "Criar Certificado" button
    #[must_use]
    pub const fn create_button(&self) -> &Locator {
        &self.create_button
    }

    /// Every certificate card
    #[must_use]
    pub const fn cards(&self) -> &Locator {
        &self.cards
    }

    /// "Salvar Certificado" button
    #[must_use]
    pub const fn save_button(&self) -> &Locator {
        &self.save_button
    }

    /// Search box
    #[must_use]
    pub const fn search_input(&self) -> &Locator {
        &self.search_input
    }

    /// Form input by id, e.g. `field("gemName")`
    pub fn field(&self, id: &str) -> SuiteResult<&Locator> {
        self.form_fields
            .iter()
            .find(|(field_id, _)| *field_id == id)
            .map(|(_, locator)| locator)
            .ok_or_else(|| SuiteError::ElementNotFound {
                selector: format!("#{id}"),
            })
    }

    /// Landing route
    #[must_use]
    pub fn welcome_url(&self) -> String {
        self.base.url("/welcome")
    }

    /// Detail route of certificate `id`
    #[must_use]
    pub fn certificate_url(&self, id: &str) -> String {
        self.base.url(&format!("/certificate?id={id}"))
    }

    // ---- navigation ----

    /// Resize to the 1280x720 form viewport
    pub async fn configure_viewport(&self) -> SuiteResult<()> {
        self.set_viewport(FORM_VIEWPORT).await
    }

    /// Resize to `viewport`
    pub async fn set_viewport(&self, viewport: Viewport) -> SuiteResult<()> {
        self.base.driver().set_viewport(viewport).await
    }

    /// Open `/welcome`
    pub async fn navigate_welcome(&self) -> SuiteResult<()> {
        self.base.navigate(&self.welcome_url()).await
    }

    // ---- actions ----

    /// Click "Criar Certificado"
    pub async fn click_create(&self) -> SuiteResult<()> {
        self.base.click(&self.create_button).await
    }

    /// Open the first card
    pub async fn click_first_card(&self) -> SuiteResult<()> {
        self.base.click(&self.cards.clone().first()).await
    }

    /// Self-verifying fill of any form field
    pub async fn fill_field(&self, locator: &Locator, value: &str) -> SuiteResult<()> {
        self.base.fill_field(locator, value).await
    }

    /// Click "Salvar Certificado"
    pub async fn save(&self) -> SuiteResult<()> {
        self.base.click(&self.save_button).await
    }

    /// Fill every form field in declaration order
    pub async fn fill_form(&self, data: &CertificateData) -> SuiteResult<()> {
        for (id, value) in data.fields() {
            self.fill_field(self.field(id)?, value).await?;
        }
        Ok(())
    }

    /// Create, fill every field, save
    pub async fn create_certificate_full(&self, data: &CertificateData) -> SuiteResult<()> {
        tracing::info!(gem = %data.gem_name, "creating certificate");
        self.click_create().await?;
        self.fill_form(data).await?;
        self.save().await
    }

    /// Clear the search box, type `query` and submit with Enter.
    ///
    /// An empty query restores the unfiltered list.
    pub async fn search(&self, query: &str) -> SuiteResult<()> {
        tracing::info!(%query, "searching certificates");
        self.base.fill_field(&self.search_input, "").await?;
        if !query.is_empty() {
            self.base.fill_field(&self.search_input, query).await?;
        }
        self.base.press("Enter").await?;
        self.base.wait_for_load().await
    }

    /// [`CertificatesPage::search`] for a certificate name
    pub async fn search_by_name(&self, name: &str) -> SuiteResult<()> {
        self.search(name).await
    }

    /// Empty the search box and resubmit
    pub async fn clear_search(&self) -> SuiteResult<()> {
        self.search("").await
    }

    /// Open the card showing `name`
    pub async fn view_card_by_name(&self, name: &str) -> SuiteResult<()> {
        self.base.click(&self.card_named(name)).await
    }

    /// Open certificate `id` by URL, confirm the URL and wait for load.
    ///
    /// How the portal treats the id is left to [`CertificatesPage::verify_outcome`].
    pub async fn query_certificate_by_id(&self, id: &str) -> SuiteResult<()> {
        tracing::info!(%id, "querying certificate");
        self.base.navigate(&self.certificate_url(id)).await?;
        self.verify_certificate_id_in_url(id).await?;
        self.base.wait_for_load().await
    }

    /// Wait until the page settles
    pub async fn wait_for_load(&self) -> SuiteResult<()> {
        self.base.wait_for_load().await
    }

    /// Fixed pause
    pub async fn wait_timeout(&self, ms: u64) {
        self.base.pause(ms).await;
    }

    // ---- verification ----

    fn card_named(&self, name: &str) -> Locator {
        self.cards.clone().with_text(name).first()
    }

    /// Number of cards currently listed
    pub async fn card_count(&self) -> SuiteResult<usize> {
        self.base.driver().count(&self.cards).await
    }

    /// The first card is visible
    pub async fn verify_loaded(&self) -> SuiteResult<()> {
        self.base.expect(&self.cards.clone().first()).to_be_visible().await
    }

    /// Exactly `n` cards are listed
    pub async fn verify_count(&self, n: usize) -> SuiteResult<()> {
        self.base.expect(&self.cards).to_have_count(n).await
    }

    /// The card at `index` is visible
    pub async fn verify_card_visible(&self, index: usize) -> SuiteResult<()> {
        self.base.expect(&self.cards.clone().nth(index)).to_be_visible().await
    }

    /// A card showing `name` is visible
    pub async fn verify_card_shown(&self, name: &str) -> SuiteResult<()> {
        self.base.expect(&self.card_named(name)).to_be_visible().await
    }

    /// The search matched nothing
    pub async fn verify_no_results(&self) -> SuiteResult<()> {
        self.verify_count(0).await
    }

    /// The URL matches `pattern`
    pub async fn verify_url(&self, pattern: &UrlPattern) -> SuiteResult<()> {
        self.base.expect_page().to_have_url(pattern).await
    }

    /// The URL is a certificate detail route
    pub async fn verify_certificate_url(&self) -> SuiteResult<()> {
        self.verify_url(&UrlPattern::Regex(CERTIFICATE_URL.to_string()))
            .await
    }

    /// The URL is the welcome route
    pub async fn verify_welcome_url(&self) -> SuiteResult<()> {
        self.verify_url(&UrlPattern::Regex(WELCOME_URL.to_string()))
            .await
    }

    /// The URL is `/certificate?id=<id>`, optionally followed by more
    /// parameters or a fragment
    pub async fn verify_certificate_id_in_url(&self, id: &str) -> SuiteResult<()> {
        let pattern = format!(r"/certificate\?id={}([&#].*)?$", regex::escape(id));
        self.verify_url(&UrlPattern::Regex(pattern)).await
    }

    /// `locator` is visible
    pub async fn verify_visible(&self, locator: &Locator) -> SuiteResult<()> {
        self.base.expect(locator).to_be_visible().await
    }

    /// The field holds exactly `expected`
    pub async fn verify_field_value(&self, locator: &Locator, expected: &str) -> SuiteResult<()> {
        self.base.expect(locator).to_have_value(expected).await
    }

    /// The element's text equals `expected`
    pub async fn verify_text(&self, locator: &Locator, expected: &str) -> SuiteResult<()> {
        self.base.expect(locator).to_have_text(expected).await
    }

    /// The portal answered an unusable id the way `expected` says
    pub async fn verify_outcome(&self, expected: &ExpectedOutcome) -> SuiteResult<()> {
        let base = &self.base;
        let options = WaitOptions::within(base.config().expect_timeout());
        match expected {
            ExpectedOutcome::ErrorText(markers) => {
                poll_until(options, &format!("one of {markers:?}"), || async move {
                    for marker in markers {
                        if base.driver().is_visible(&Locator::text(marker.as_str())).await? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                })
                .await?;
            }
            ExpectedOutcome::SoftEmpty => {
                self.verify_certificate_url().await?;
                let gem_name = self.field("gemName")?;
                let filled = match base.driver().input_value(gem_name).await {
                    Ok(value) => !value.trim().is_empty(),
                    Err(SuiteError::ElementNotFound { .. }) => false,
                    Err(err) => return Err(err),
                };
                if filled {
                    return Err(SuiteError::assertion(
                        "expected an empty certificate form, found data",
                    ));
                }
            }
            ExpectedOutcome::Redirect(route) => {
                base.wait_for_url(&UrlPattern::Contains(route.clone()), options.timeout())
                    .await?;
            }
        }
        Ok(())
    }
}

impl PageObject for CertificatesPage {
    fn base(&self) -> &BasePage {
        &self.base
    }

    fn url(&self) -> String {
        self.welcome_url()
    }

    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::Regex(WELCOME_URL.to_string())
    }

    fn page_name(&self) -> &'static str {
        "certificates"
    }
}
