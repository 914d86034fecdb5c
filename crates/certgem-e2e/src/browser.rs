//! Chromium over CDP (feature `browser`).
//!
//! [`CdpBrowser`] launches Chromium through `chromiumoxide` and spawns its
//! event handler. Each [`CdpDriver`] wraps one page and implements
//! [`PageDriver`]: locators compile to DOM queries evaluated in the page,
//! keys and viewport go through CDP input/emulation, and route rules install
//! Fetch-domain interception.

use crate::config::SuiteConfig;
use crate::context::{Cookie, SameSite, StorageState};
use crate::driver::{PageDriver, Viewport};
use crate::locator::{js_str, Locator};
use crate::network::{AbortReason, RouteAction, RouteRule};
use crate::result::{SuiteError, SuiteResult};
use crate::wait::{poll_until, LoadState, WaitOptions, NETWORK_IDLE_THRESHOLD_MS};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::dom_storage::{
    EnableParams as DomStorageEnableParams, SetDomStorageItemParams, StorageId,
};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused,
    FailRequestParams, RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::network::{
    ClearBrowserCookiesParams, CookieParam, CookieSameSite, ErrorReason, TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

fn page_err(e: impl fmt::Display) -> SuiteError {
    SuiteError::page(e.to_string())
}

fn route_err(e: impl fmt::Display) -> SuiteError {
    SuiteError::RouteError {
        message: e.to_string(),
    }
}

/// Browser instance with a live CDP connection
pub struct CdpBrowser {
    config: SuiteConfig,
    inner: Arc<Mutex<Browser>>,
    handle: JoinHandle<()>,
}

impl fmt::Debug for CdpBrowser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdpBrowser")
            .field("headless", &self.config.headless)
            .field("viewport", &self.config.viewport)
            .finish()
    }
}

impl CdpBrowser {
    /// Launch Chromium as `config` describes
    ///
    /// # Errors
    ///
    /// [`SuiteError::BrowserNotFound`] when no executable is configured or
    /// detected, [`SuiteError::BrowserLaunchError`] when it fails to start.
    pub async fn launch(config: &SuiteConfig) -> SuiteResult<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(config.viewport.width, config.viewport.height);
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(|message| {
            if config.chromium_path.is_none() {
                tracing::error!(%message, "no chromium executable found");
                SuiteError::BrowserNotFound
            } else {
                SuiteError::BrowserLaunchError { message }
            }
        })?;

        let (browser, mut handler) =
            Browser::launch(cdp_config)
                .await
                .map_err(|e| SuiteError::BrowserLaunchError {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::info!(headless = config.headless, "browser launched");
        Ok(Self {
            config: config.clone(),
            inner: Arc::new(Mutex::new(browser)),
            handle,
        })
    }

    /// Open a blank page sized to the configured viewport
    pub async fn new_page(&self) -> SuiteResult<CdpDriver> {
        let page = self
            .inner
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(page_err)?;
        let driver = CdpDriver::new(page);
        driver.set_viewport(self.config.viewport).await?;
        Ok(driver)
    }

    /// Close the browser and stop its handler
    pub async fn close(self) -> SuiteResult<()> {
        let result = self.inner.lock().await.close().await;
        self.handle.abort();
        result
            .map(|_| ())
            .map_err(|e| SuiteError::BrowserLaunchError {
                message: e.to_string(),
            })
    }
}

/// Web storage of the current origin, as read back from the page
#[derive(Debug, Deserialize)]
struct WebStorage {
    origin: String,
    local: HashMap<String, String>,
    session: HashMap<String, String>,
}

const WEB_STORAGE_JS: &str = "return { origin: location.origin, \
    local: Object.fromEntries(Object.entries(localStorage)), \
    session: Object.fromEntries(Object.entries(sessionStorage)) };";

const VISIBLE_JS: &str = "(() => { const s = getComputedStyle(el); \
    return s.visibility !== 'hidden' && s.display !== 'none' && \
    !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length); })()";

const FILL_JS: &str = "(() => { el.focus(); \
    const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
    Object.getOwnPropertyDescriptor(proto, 'value').set.call(el, VALUE); \
    el.dispatchEvent(new Event('input', { bubbles: true })); \
    el.dispatchEvent(new Event('change', { bubbles: true })); \
    return true; })()";

/// CDP error reason for an abort
const fn error_reason(reason: AbortReason) -> ErrorReason {
    match reason {
        AbortReason::Failed => ErrorReason::Failed,
        AbortReason::Aborted => ErrorReason::Aborted,
        AbortReason::TimedOut => ErrorReason::TimedOut,
        AbortReason::AccessDenied => ErrorReason::AccessDenied,
        AbortReason::ConnectionRefused => ErrorReason::ConnectionRefused,
        AbortReason::ConnectionReset => ErrorReason::ConnectionReset,
        AbortReason::InternetDisconnected => ErrorReason::InternetDisconnected,
        AbortReason::NameNotResolved => ErrorReason::NameNotResolved,
        AbortReason::BlockedByClient => ErrorReason::BlockedByClient,
    }
}

/// Key, code, virtual key code and text for a named key
fn key_definition(key: &str) -> (String, String, i64, Option<String>) {
    match key {
        "Enter" => ("Enter".into(), "Enter".into(), 13, Some("\r".into())),
        "Tab" => ("Tab".into(), "Tab".into(), 9, None),
        "Escape" => ("Escape".into(), "Escape".into(), 27, None),
        "Backspace" => ("Backspace".into(), "Backspace".into(), 8, None),
        other => {
            let vk = other
                .chars()
                .next()
                .filter(|_| other.chars().count() == 1)
                .map_or(0, |c| i64::from(u32::from(c.to_ascii_uppercase())));
            let text = (other.chars().count() == 1).then(|| other.to_string());
            (other.to_string(), other.to_string(), vk, text)
        }
    }
}

/// One Chromium page driven over CDP
pub struct CdpDriver {
    page: Page,
    routes: Arc<StdMutex<Vec<RouteRule>>>,
    interceptor: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for CdpDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner).len();
        f.debug_struct("CdpDriver").field("routes", &routes).finish()
    }
}

impl Drop for CdpDriver {
    fn drop(&mut self) {
        if let Some(handle) = self.interceptor.get_mut().take() {
            handle.abort();
        }
    }
}

impl CdpDriver {
    fn new(page: Page) -> Self {
        Self {
            page,
            routes: Arc::new(StdMutex::new(Vec::new())),
            interceptor: Mutex::new(None),
        }
    }

    /// Evaluate a function body in the page and decode its JSON result
    async fn eval_json<T: DeserializeOwned>(&self, body: &str) -> SuiteResult<T> {
        let expr = format!("JSON.stringify((() => {{ {body} }})())");
        let json: String = self
            .page
            .evaluate(expr)
            .await
            .map_err(page_err)?
            .into_value()
            .map_err(page_err)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Evaluate `expr` with `el` bound to the locator's target
    async fn on_element<T: DeserializeOwned>(&self, locator: &Locator, expr: &str) -> SuiteResult<T> {
        let body = format!(
            "const el = {}; if (!el) return null; return {expr};",
            locator.to_query()
        );
        let value: Option<T> = self.eval_json(&body).await?;
        value.ok_or_else(|| SuiteError::ElementNotFound {
            selector: locator.to_string(),
        })
    }

    async fn dispatch_key(&self, kind: DispatchKeyEventType, key: &str) -> SuiteResult<()> {
        let (key, code, vk, text) = key_definition(key);
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind.clone())
            .key(key)
            .code(code)
            .windows_virtual_key_code(vk);
        if let (DispatchKeyEventType::KeyDown, Some(text)) = (kind, text) {
            builder = builder.text(text);
        }
        let params = builder.build().map_err(page_err)?;
        self.page.execute(params).await.map_err(page_err)?;
        Ok(())
    }

    /// Re-enable Fetch with one pattern per installed rule
    async fn sync_interception(&self) -> SuiteResult<()> {
        let patterns: Vec<RequestPattern> = self
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|rule| {
                RequestPattern::builder()
                    .url_pattern(rule.pattern.fetch_pattern())
                    .request_stage(RequestStage::Request)
                    .build()
            })
            .collect();
        let params = FetchEnableParams::builder().patterns(patterns).build();
        self.page.execute(params).await.map_err(route_err)?;
        Ok(())
    }

    async fn ensure_interceptor(&self) -> SuiteResult<()> {
        let mut slot = self.interceptor.lock().await;
        if slot.is_some() {
            return Ok(());
        }
        let mut events = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(route_err)?;
        let page = self.page.clone();
        let routes = Arc::clone(&self.routes);
        *slot = Some(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let url = event.request.url.clone();
                let action = routes
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .iter()
                    .rev()
                    .find(|rule| rule.matches(&url))
                    .map(|rule| rule.action);
                let page = page.clone();
                let id = event.request_id.clone();
                tokio::spawn(async move {
                    let result = match action {
                        Some(RouteAction::Abort(reason)) => {
                            tracing::debug!(%url, reason = reason.message(), "aborting request");
                            page.execute(FailRequestParams::new(id, error_reason(reason)))
                                .await
                                .map(|_| ())
                        }
                        Some(RouteAction::Delay(ms)) => {
                            tracing::debug!(%url, ms, "delaying request");
                            tokio::time::sleep(Duration::from_millis(ms)).await;
                            page.execute(ContinueRequestParams::new(id)).await.map(|_| ())
                        }
                        Some(RouteAction::Continue) | None => {
                            page.execute(ContinueRequestParams::new(id)).await.map(|_| ())
                        }
                    };
                    if let Err(error) = result {
                        tracing::warn!(%url, %error, "failed to resolve intercepted request");
                    }
                });
            }
        }));
        Ok(())
    }

    async fn wait_ready_state(&self, complete: bool, timeout: Duration) -> SuiteResult<()> {
        let check = if complete {
            "return document.readyState === 'complete';"
        } else {
            "return document.readyState !== 'loading';"
        };
        poll_until(WaitOptions::within(timeout), "document ready state", || {
            self.eval_json::<bool>(check)
        })
        .await
        .map(|_| ())
    }

    /// Load complete and the resource list unchanged for the idle threshold
    async fn wait_network_idle(&self, timeout: Duration) -> SuiteResult<()> {
        let start = Instant::now();
        self.wait_ready_state(true, timeout).await?;
        let threshold = Duration::from_millis(NETWORK_IDLE_THRESHOLD_MS);
        let options = WaitOptions::within(timeout);
        let mut last = usize::MAX;
        let mut stable_since = Instant::now();
        loop {
            let count: usize = self
                .eval_json("return performance.getEntriesByType('resource').length;")
                .await?;
            if count != last {
                last = count;
                stable_since = Instant::now();
            } else if stable_since.elapsed() >= threshold {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(SuiteError::Timeout {
                    ms: options.timeout_ms,
                    waiting_for: LoadState::NetworkIdle.to_string(),
                });
            }
            tokio::time::sleep(options.poll_interval()).await;
        }
    }
}

#[async_trait]
impl PageDriver for CdpDriver {
    fn name(&self) -> &'static str {
        "chromium"
    }

    async fn goto(&self, url: &str) -> SuiteResult<()> {
        tracing::debug!(%url, "goto");
        self.page
            .goto(url)
            .await
            .map_err(|e| SuiteError::NavigationError {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> SuiteResult<String> {
        Ok(self.page.url().await.map_err(page_err)?.unwrap_or_default())
    }

    async fn title(&self) -> SuiteResult<String> {
        Ok(self.page.get_title().await.map_err(page_err)?.unwrap_or_default())
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> SuiteResult<()> {
        match state {
            LoadState::DomContentLoaded => self.wait_ready_state(false, timeout).await,
            LoadState::Load => self.wait_ready_state(true, timeout).await,
            LoadState::NetworkIdle => self.wait_network_idle(timeout).await,
        }
    }

    async fn count(&self, locator: &Locator) -> SuiteResult<usize> {
        self.eval_json(&format!("return {};", locator.selector().to_count_query()))
            .await
    }

    async fn is_visible(&self, locator: &Locator) -> SuiteResult<bool> {
        match self.on_element::<bool>(locator, VISIBLE_JS).await {
            Err(SuiteError::ElementNotFound { .. }) => Ok(false),
            other => other,
        }
    }

    async fn is_enabled(&self, locator: &Locator) -> SuiteResult<bool> {
        self.on_element(
            locator,
            "!el.disabled && el.getAttribute('aria-disabled') !== 'true'",
        )
        .await
    }

    async fn input_value(&self, locator: &Locator) -> SuiteResult<String> {
        self.on_element(locator, "el.value ?? ''").await
    }

    async fn text_content(&self, locator: &Locator) -> SuiteResult<String> {
        self.on_element(locator, "el.textContent ?? ''").await
    }

    async fn class_name(&self, locator: &Locator) -> SuiteResult<String> {
        self.on_element(locator, "el.getAttribute('class') ?? ''").await
    }

    async fn click(&self, locator: &Locator) -> SuiteResult<()> {
        tracing::debug!(%locator, "click");
        self.on_element::<bool>(
            locator,
            "(() => { el.scrollIntoView({ block: 'center' }); el.focus(); el.click(); return true; })()",
        )
        .await
        .map(|_| ())
    }

    async fn focus(&self, locator: &Locator) -> SuiteResult<()> {
        self.on_element::<bool>(locator, "(() => { el.focus(); return true; })()")
            .await
            .map(|_| ())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> SuiteResult<()> {
        if !self.is_enabled(locator).await? {
            return Err(SuiteError::page(format!("{locator} is disabled")));
        }
        let script = FILL_JS.replace("VALUE", &js_str(value));
        self.on_element::<bool>(locator, &script).await.map(|_| ())
    }

    async fn press(&self, key: &str) -> SuiteResult<()> {
        tracing::debug!(%key, "press");
        self.dispatch_key(DispatchKeyEventType::KeyDown, key).await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp, key).await
    }

    async fn set_viewport(&self, viewport: Viewport) -> SuiteResult<()> {
        let params = SetDeviceMetricsOverrideParams::new(
            i64::from(viewport.width),
            i64::from(viewport.height),
            1.0,
            false,
        );
        self.page.execute(params).await.map_err(page_err)?;
        Ok(())
    }

    async fn clear_cookies(&self) -> SuiteResult<()> {
        self.page
            .execute(ClearBrowserCookiesParams::default())
            .await
            .map_err(page_err)?;
        Ok(())
    }

    async fn clear_web_storage(&self) -> SuiteResult<()> {
        self.eval_json::<bool>("localStorage.clear(); sessionStorage.clear(); return true;")
            .await
            .map(|_| ())
    }

    async fn storage_state(&self) -> SuiteResult<StorageState> {
        let mut state = StorageState::new();
        for cookie in self.page.get_cookies().await.map_err(page_err)? {
            state.cookies.push(Cookie {
                name: cookie.name,
                value: cookie.value,
                domain: cookie.domain,
                path: cookie.path,
                expires: (!cookie.session).then_some(cookie.expires),
                http_only: cookie.http_only,
                secure: cookie.secure,
                same_site: match cookie.same_site {
                    Some(CookieSameSite::Strict) => SameSite::Strict,
                    Some(CookieSameSite::None) => SameSite::None,
                    _ => SameSite::Lax,
                },
            });
        }
        let web: WebStorage = self.eval_json(WEB_STORAGE_JS).await?;
        if web.origin != "null" {
            if !web.local.is_empty() {
                state.local_storage.insert(web.origin.clone(), web.local);
            }
            if !web.session.is_empty() {
                state.session_storage.insert(web.origin, web.session);
            }
        }
        Ok(state)
    }

    async fn apply_storage_state(&self, state: &StorageState) -> SuiteResult<()> {
        let mut cookies = Vec::with_capacity(state.cookies.len());
        for cookie in &state.cookies {
            let mut builder = CookieParam::builder()
                .name(cookie.name.clone())
                .value(cookie.value.clone())
                .domain(cookie.domain.clone())
                .path(cookie.path.clone())
                .http_only(cookie.http_only)
                .secure(cookie.secure)
                .same_site(match cookie.same_site {
                    SameSite::Strict => CookieSameSite::Strict,
                    SameSite::Lax => CookieSameSite::Lax,
                    SameSite::None => CookieSameSite::None,
                });
            if let Some(expires) = cookie.expires {
                builder = builder.expires(TimeSinceEpoch::new(expires));
            }
            cookies.push(builder.build().map_err(page_err)?);
        }
        if !cookies.is_empty() {
            self.page.set_cookies(cookies).await.map_err(page_err)?;
        }

        self.page
            .execute(DomStorageEnableParams::default())
            .await
            .map_err(page_err)?;
        let areas = [(&state.local_storage, true), (&state.session_storage, false)];
        for (area, is_local) in areas {
            for (origin, items) in area {
                let id = StorageId::builder()
                    .security_origin(origin.clone())
                    .is_local_storage(is_local)
                    .build()
                    .map_err(page_err)?;
                for (key, value) in items {
                    self.page
                        .execute(SetDomStorageItemParams::new(id.clone(), key.clone(), value.clone()))
                        .await
                        .map_err(page_err)?;
                }
            }
        }
        tracing::debug!(cookies = state.cookies.len(), origins = state.origins().len(), "storage state applied");
        Ok(())
    }

    async fn route(&self, rule: RouteRule) -> SuiteResult<()> {
        tracing::info!(pattern = %rule.pattern, action = ?rule.action, "installing route");
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(rule);
        self.ensure_interceptor().await?;
        self.sync_interception().await
    }

    async fn screenshot(&self) -> SuiteResult<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        self.page
            .screenshot(params)
            .await
            .map_err(|e| SuiteError::ScreenshotError {
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_definitions() {
        assert_eq!(key_definition("Enter").2, 13);
        assert_eq!(key_definition("Enter").3.as_deref(), Some("\r"));
        assert_eq!(key_definition("a").2, 65);
        assert_eq!(key_definition("F5").3, None);
    }

    #[test]
    fn test_error_reason_mapping() {
        assert!(matches!(error_reason(AbortReason::Failed), ErrorReason::Failed));
        assert!(matches!(
            error_reason(AbortReason::BlockedByClient),
            ErrorReason::BlockedByClient
        ));
    }

    #[test]
    fn test_fill_script_quotes_value() {
        let script = FILL_JS.replace("VALUE", &js_str("Ametista \"Especial\" & Rara"));
        assert!(script.contains(r#"set.call(el, "Ametista \"Especial\" & Rara")"#));
    }
}
