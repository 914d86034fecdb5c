//! Login screen.

use crate::config::SuiteConfig;
use crate::context::AuthSnapshot;
use crate::driver::PageDriver;
use crate::fallback::{FallbackChain, Outcome};
use crate::locator::{AriaRole, Locator};
use crate::network::UrlPattern;
use crate::page_object::{BasePage, PageObject};
use crate::result::{SuiteError, SuiteResult};
use crate::wait::CREDENTIAL_PROBE_TIMEOUT_MS;
use std::sync::Arc;
use std::time::Duration;

/// Messages the portal has used for rejected credentials
pub const CREDENTIAL_ERRORS: [&str; 6] = [
    "Email ou senha incorretos",
    "E-mail inválido",
    "Erro no login Email ou senha incorretos. Tente novamente.",
    "Credenciais inválidas",
    "Login inválido",
    "Usuário ou senha incorretos",
];

/// Inline message for a missing email
pub const EMAIL_REQUIRED: &str = "Email é obrigatório";

/// Inline message for a missing password
pub const PASSWORD_REQUIRED: &str = "Senha é obrigatória";

/// Default bound of [`LoginPage::wait_for_url`]
pub const URL_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Pause before probing for credential errors
const CREDENTIAL_SETTLE_MS: u64 = 1_000;

/// Page object for `/login` and the public home page's entry link
#[derive(Debug, Clone)]
pub struct LoginPage {
    base: BasePage,
    email_input: Locator,
    password_input: Locator,
    entrar_button: Locator,
    logout_button: Locator,
    sair_button: Locator,
    entrar_link: Locator,
}

impl LoginPage {
    /// Build the page's locators; nothing is resolved yet
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>, config: SuiteConfig) -> Self {
        Self {
            base: BasePage::new(driver, config),
            email_input: Locator::role(AriaRole::Textbox, "Email"),
            password_input: Locator::role(AriaRole::Textbox, "Senha"),
            entrar_button: Locator::role(AriaRole::Button, "Entrar"),
            logout_button: Locator::text("Logout"),
            sair_button: Locator::text("Sair"),
            entrar_link: Locator::role(AriaRole::Link, "Entrar"),
        }
    }

    /// Email textbox
    #[must_use]
    pub const fn email_input(&self) -> &Locator {
        &self.email_input
    }

    /// Password textbox
    #[must_use]
    pub const fn password_input(&self) -> &Locator {
        &self.password_input
    }

    /// Submit button
    #[must_use]
    pub const fn entrar_button(&self) -> &Locator {
        &self.entrar_button
    }

    /// Portal root
    #[must_use]
    pub fn base_url(&self) -> String {
        self.base.url("/")
    }

    /// Login route
    #[must_use]
    pub fn login_url(&self) -> String {
        self.base.url("/login")
    }

    /// Landing route after a successful login
    #[must_use]
    pub fn welcome_url(&self) -> String {
        self.base.url("/welcome")
    }

    // ---- navigation ----

    /// Open the public home page
    pub async fn navigate_home(&self) -> SuiteResult<()> {
        self.base.navigate(&self.base_url()).await
    }

    /// Open `/login` directly
    pub async fn navigate(&self) -> SuiteResult<()> {
        self.base.navigate(&self.login_url()).await
    }

    /// Open the home page and follow its "Entrar" link
    pub async fn navigate_via_link(&self) -> SuiteResult<()> {
        self.navigate_home().await?;
        self.base.click(&self.entrar_link).await
    }

    // ---- actions ----

    /// Fill the email field
    pub async fn fill_email(&self, email: &str) -> SuiteResult<()> {
        self.base.fill_field(&self.email_input, email).await
    }

    /// Fill the password field
    pub async fn fill_password(&self, password: &str) -> SuiteResult<()> {
        self.base.fill_field(&self.password_input, password).await
    }

    /// Click "Entrar"
    pub async fn click_entrar(&self) -> SuiteResult<()> {
        self.base.click(&self.entrar_button).await
    }

    /// Fill both fields and submit
    pub async fn login(&self, email: &str, password: &str) -> SuiteResult<()> {
        tracing::info!(%email, "logging in");
        self.fill_email(email).await?;
        self.fill_password(password).await?;
        self.click_entrar().await
    }

    /// [`LoginPage::login`] with the fields resolved through their labels
    pub async fn login_with_label(&self, email: &str, password: &str) -> SuiteResult<()> {
        tracing::info!(%email, "logging in by label");
        self.base.fill_field(&Locator::label("Email"), email).await?;
        self.base.fill_field(&Locator::label("Senha"), password).await?;
        self.click_entrar().await
    }

    /// End the session: "Logout", else "Sair", else wipe cookies and web storage
    pub async fn logout(&self) -> SuiteResult<Outcome> {
        let base = &self.base;
        let click_if_visible = move |locator: &Locator| {
            let locator = locator.clone();
            move || async move {
                if !base.driver().is_visible(&locator).await? {
                    return Err(SuiteError::page(format!("{locator} is not visible")));
                }
                base.driver().click(&locator).await
            }
        };
        FallbackChain::new("logout")
            .then("Logout control", click_if_visible(&self.logout_button))
            .then("Sair control", click_if_visible(&self.sair_button))
            .then("clear cookies and storage", move || async move {
                base.driver().clear_cookies().await?;
                base.driver().clear_web_storage().await
            })
            .run()
            .await
    }

    /// Capture cookies and web storage into `snapshot`
    pub async fn save_auth_state(&self, snapshot: &AuthSnapshot) -> SuiteResult<()> {
        let state = self.base.driver().storage_state().await?;
        snapshot.save(&state)
    }

    /// Focus the email field
    pub async fn focus_email(&self) -> SuiteResult<()> {
        self.base.focus(&self.email_input).await
    }

    /// Focus the password field
    pub async fn focus_password(&self) -> SuiteResult<()> {
        self.base.focus(&self.password_input).await
    }

    // ---- verification ----

    /// The document title matches the regex `pattern`
    pub async fn verify_title(&self, pattern: &str) -> SuiteResult<()> {
        self.base.expect_page().to_have_title(pattern).await
    }

    /// Wait for `message` to be visible and return its locator
    pub async fn verify_error_message(&self, message: &str) -> SuiteResult<Locator> {
        let locator = Locator::text(message);
        self.base
            .wait_visible_within(&locator, self.base.config().expect_timeout())
            .await?;
        Ok(locator)
    }

    /// Wait until the URL equals `url`
    pub async fn wait_for_url(&self, url: &str, timeout: Option<Duration>) -> SuiteResult<()> {
        let timeout = timeout.unwrap_or(Duration::from_millis(URL_WAIT_TIMEOUT_MS));
        self.base
            .wait_for_url(&UrlPattern::Exact(url.to_string()), timeout)
            .await
    }

    /// URL once the page has finished loading
    pub async fn current_url_after_load(&self) -> SuiteResult<String> {
        self.base.settled_url().await
    }

    /// The settled URL contains `fragment`
    pub async fn verify_url_contains(&self, fragment: &str) -> SuiteResult<()> {
        let url = self.current_url_after_load().await?;
        if url.contains(fragment) {
            Ok(())
        } else {
            Err(SuiteError::assertion(format!(
                "expected URL to contain {fragment:?}, got {url}"
            )))
        }
    }

    /// The settled URL does not contain `fragment`
    pub async fn verify_url_not_contains(&self, fragment: &str) -> SuiteResult<()> {
        let url = self.current_url_after_load().await?;
        if url.contains(fragment) {
            Err(SuiteError::assertion(format!(
                "expected URL not to contain {fragment:?}, got {url}"
            )))
        } else {
            Ok(())
        }
    }

    /// Required-password feedback: message, else error class, else disabled submit
    pub async fn verify_password_required(&self) -> SuiteResult<Outcome> {
        let base = &self.base;
        FallbackChain::new("password-required validation")
            .then("required message", move || async move {
                base.expect(&Locator::text(PASSWORD_REQUIRED)).to_be_visible().await
            })
            .then("error class", move || async move {
                base.expect(&self.password_input).to_have_class("error").await
            })
            .then("submit disabled", move || async move {
                base.expect(&self.entrar_button).to_be_disabled().await
            })
            .run()
            .await
    }

    /// Both fields empty: disabled submit, else both messages, else either one
    pub async fn verify_empty_fields_validation(&self) -> SuiteResult<Outcome> {
        let base = &self.base;
        let email_msg = &Locator::text(EMAIL_REQUIRED);
        let password_msg = &Locator::text(PASSWORD_REQUIRED);
        FallbackChain::new("empty-fields validation")
            .then("submit disabled", move || async move {
                base.expect(&self.entrar_button).to_be_disabled().await
            })
            .then("both messages", move || async move {
                base.expect(email_msg).to_be_visible().await?;
                base.expect(password_msg).to_be_visible().await
            })
            .then("either message", move || async move {
                let email = base.driver().is_visible(email_msg).await.unwrap_or(false);
                let password = base.driver().is_visible(password_msg).await.unwrap_or(false);
                if email || password {
                    Ok(())
                } else {
                    Err(SuiteError::assertion("neither required-field message is visible"))
                }
            })
            .or_fail("no required-field validation detected")
            .run()
            .await
    }

    /// Whitespace-only input: disabled submit, else the email message
    pub async fn verify_whitespace_validation(&self) -> SuiteResult<Outcome> {
        let base = &self.base;
        FallbackChain::new("whitespace validation")
            .then("submit disabled", move || async move {
                base.expect(&self.entrar_button).to_be_disabled().await
            })
            .then("email required message", move || async move {
                base.expect(&Locator::text(EMAIL_REQUIRED)).to_be_visible().await
            })
            .run()
            .await
    }

    /// Rejected credentials: any known message within 2s each, else still on `/login`
    pub async fn verify_credentials_error(&self) -> SuiteResult<Outcome> {
        self.base.pause(CREDENTIAL_SETTLE_MS).await;
        let base = &self.base;
        let probe = Duration::from_millis(CREDENTIAL_PROBE_TIMEOUT_MS);
        let mut chain = FallbackChain::new("credentials error");
        for message in CREDENTIAL_ERRORS {
            chain = chain.then(format!("message {message:?}"), move || async move {
                base.wait_visible_within(&Locator::text(message), probe).await
            });
        }
        chain
            .then("stayed on /login", move || async move {
                let url = base.driver().current_url().await?;
                if url.contains("/login") {
                    Ok(())
                } else {
                    Err(SuiteError::assertion(format!("left the login screen for {url}")))
                }
            })
            .or_fail("expected a credentials error or to stay on the login screen")
            .run()
            .await
    }

    /// Whether the email field is empty after trimming
    pub async fn is_email_empty(&self) -> SuiteResult<bool> {
        let value = self.base.driver().input_value(&self.email_input).await?;
        Ok(value.trim().is_empty())
    }

    /// Whether the password field is empty after trimming
    pub async fn is_password_empty(&self) -> SuiteResult<bool> {
        let value = self.base.driver().input_value(&self.password_input).await?;
        Ok(value.trim().is_empty())
    }

    /// Whether "Entrar" accepts clicks
    pub async fn is_entrar_enabled(&self) -> SuiteResult<bool> {
        self.base.driver().is_enabled(&self.entrar_button).await
    }
}

impl PageObject for LoginPage {
    fn base(&self) -> &BasePage {
        &self.base
    }

    fn url(&self) -> String {
        self.login_url()
    }

    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::Regex(r"/login(\?.*)?$".to_string())
    }

    fn page_name(&self) -> &'static str {
        "login"
    }
}
