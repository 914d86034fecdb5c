//! In-memory page driver for tests without a browser.
//!
//! A [`MockDriver`] holds a tiny page model: a URL, a title, a flat list of
//! [`MockElement`]s, cookies and web storage. Behaviour is scripted with
//! reactions that mutate the model when the page is loaded, an element is
//! clicked or filled, or a key is pressed. Reactions may schedule further
//! changes with [`MockState::after`]; those apply once `tokio` time reaches
//! them, so tests with paused time observe loading indicators and delayed
//! responses deterministically.

use crate::context::{Cookie, StorageState};
use crate::driver::{PageDriver, Viewport};
use crate::locator::{text_matches, AriaRole, Locator, Selector};
use crate::network::{RouteAction, RouteRule, UrlPattern};
use crate::result::{SuiteError, SuiteResult};
use crate::wait::LoadState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Scripted page behaviour
pub type Reaction = Arc<dyn Fn(&mut MockState) + Send + Sync>;

/// PNG signature returned as the mock screenshot
const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// An element in the mock page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Unique key used by reactions to address the element
    pub key: String,
    /// CSS selectors the element answers to, compared verbatim
    pub css: Vec<String>,
    /// ARIA role
    pub role: Option<AriaRole>,
    /// Accessible name (falls back to label, placeholder, then text)
    pub name: Option<String>,
    /// Associated label text
    pub label: Option<String>,
    /// Placeholder attribute
    pub placeholder: Option<String>,
    /// data-testid attribute
    pub test_id: Option<String>,
    /// Text content
    pub text: String,
    /// Input value
    pub value: String,
    /// Whether the element is rendered
    pub visible: bool,
    /// Whether the element accepts input
    pub enabled: bool,
    /// CSS classes
    pub classes: Vec<String>,
}

impl MockElement {
    /// A visible, enabled element with no selectors yet
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            css: Vec::new(),
            role: None,
            name: None,
            label: None,
            placeholder: None,
            test_id: None,
            text: String::new(),
            value: String::new(),
            visible: true,
            enabled: true,
            classes: Vec::new(),
        }
    }

    /// Element answering to `css`
    #[must_use]
    pub fn css(key: impl Into<String>, css: impl Into<String>) -> Self {
        Self::new(key).also_css(css)
    }

    /// Answer to an additional CSS selector
    #[must_use]
    pub fn also_css(mut self, css: impl Into<String>) -> Self {
        self.css.push(css.into());
        self
    }

    /// Set role and accessible name
    #[must_use]
    pub fn with_role(mut self, role: AriaRole, name: impl Into<String>) -> Self {
        self.role = Some(role);
        self.name = Some(name.into());
        self
    }

    /// Set label text
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set placeholder
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Set data-testid
    #[must_use]
    pub fn with_test_id(mut self, id: impl Into<String>) -> Self {
        self.test_id = Some(id.into());
        self
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set input value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Add a CSS class
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Start hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Start disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn accessible_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.label.as_deref())
            .or(self.placeholder.as_deref())
            .unwrap_or(&self.text)
    }

    /// Whether this element satisfies `selector`
    #[must_use]
    pub fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Css { css } => self.css.iter().any(|c| c == css),
            Selector::Text { text } => text_matches(&self.text, text),
            Selector::Role { role, name } => {
                self.role == Some(*role)
                    && name.as_ref().map_or(true, |n| {
                        self.accessible_name()
                            .trim()
                            .to_lowercase()
                            .contains(&n.to_lowercase())
                    })
            }
            Selector::Label { text } => self
                .label
                .as_deref()
                .is_some_and(|l| l.contains(text.as_str())),
            Selector::Placeholder { text } => self
                .placeholder
                .as_deref()
                .is_some_and(|p| p.contains(text.as_str())),
            Selector::TestId { id } => self.test_id.as_deref() == Some(id.as_str()),
            Selector::CssWithText { css, text } => {
                self.css.iter().any(|c| c == css) && text_matches(&self.text, text)
            }
        }
    }
}

/// Scheme, host and port of `url`
#[must_use]
pub fn origin_of(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let rest = &url[scheme_end + 3..];
    let host_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    url[..scheme_end + 3 + host_end].to_string()
}

/// The mutable page model reactions operate on
pub struct MockState {
    /// Current URL
    pub url: String,
    /// Document title
    pub title: String,
    /// Elements in document order
    pub elements: Vec<MockElement>,
    /// Cookies and web storage
    pub storage: StorageState,
    /// Current viewport
    pub viewport: Viewport,
    /// Installed routes
    pub routes: Vec<RouteRule>,
    /// Key of the focused element
    pub focused: Option<String>,
    pending: Vec<(Instant, Reaction)>,
}

impl fmt::Debug for MockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockState")
            .field("url", &self.url)
            .field("title", &self.title)
            .field("elements", &self.elements.len())
            .field("focused", &self.focused)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            url: "about:blank".to_string(),
            title: String::new(),
            elements: Vec::new(),
            storage: StorageState::default(),
            viewport: Viewport::default(),
            routes: Vec::new(),
            focused: None,
            pending: Vec::new(),
        }
    }
}

impl MockState {
    /// Append an element
    pub fn insert(&mut self, element: MockElement) {
        self.elements.push(element);
    }

    /// Remove every element whose key satisfies `pred`
    pub fn remove_where(&mut self, pred: impl Fn(&MockElement) -> bool) {
        self.elements.retain(|e| !pred(e));
    }

    /// Remove the element with `key`
    pub fn remove(&mut self, key: &str) {
        self.remove_where(|e| e.key == key);
    }

    /// Element by key
    #[must_use]
    pub fn element(&self, key: &str) -> Option<&MockElement> {
        self.elements.iter().find(|e| e.key == key)
    }

    /// Mutable element by key
    pub fn element_mut(&mut self, key: &str) -> Option<&mut MockElement> {
        self.elements.iter_mut().find(|e| e.key == key)
    }

    /// Value of the element with `key`, empty when absent
    #[must_use]
    pub fn value(&self, key: &str) -> String {
        self.element(key).map(|e| e.value.clone()).unwrap_or_default()
    }

    /// Show or hide the element with `key`
    pub fn set_visible(&mut self, key: &str, visible: bool) {
        if let Some(element) = self.element_mut(key) {
            element.visible = visible;
        }
    }

    /// Enable or disable the element with `key`
    pub fn set_enabled(&mut self, key: &str, enabled: bool) {
        if let Some(element) = self.element_mut(key) {
            element.enabled = enabled;
        }
    }

    /// Elements matching the locator's selector
    #[must_use]
    pub fn find(&self, locator: &Locator) -> Vec<&MockElement> {
        self.elements
            .iter()
            .filter(|e| e.matches(locator.selector()))
            .collect()
    }

    /// The element a single-element operation would act on
    #[must_use]
    pub fn target(&self, locator: &Locator) -> Option<&MockElement> {
        self.find(locator).into_iter().nth(locator.index())
    }

    /// Local storage of the current origin
    pub fn local_storage(&mut self) -> &mut HashMap<String, String> {
        let origin = origin_of(&self.url);
        self.storage.local_storage.entry(origin).or_default()
    }

    /// Whether a cookie named `name` is set
    #[must_use]
    pub fn has_cookie(&self, name: &str) -> bool {
        self.storage.cookies.iter().any(|c| c.name == name)
    }

    /// Set a cookie for the current origin's host
    pub fn set_cookie(&mut self, name: &str, value: &str) {
        let origin = origin_of(&self.url);
        let host = origin
            .split("://")
            .nth(1)
            .and_then(|h| h.split(':').next())
            .unwrap_or("localhost")
            .to_string();
        self.storage.cookies.retain(|c| c.name != name);
        self.storage.cookies.push(Cookie::new(name, value, &host));
    }

    /// Action of the most recent route matching `url`
    #[must_use]
    pub fn route_for(&self, url: &str) -> Option<RouteAction> {
        self.routes
            .iter()
            .rev()
            .find(|r| r.matches(url))
            .map(|r| r.action)
    }

    /// Run `reaction` once `delay` has elapsed
    pub fn after(&mut self, delay: Duration, reaction: impl Fn(&mut MockState) + Send + Sync + 'static) {
        self.pending.push((Instant::now() + delay, Arc::new(reaction)));
    }

    /// Whether scheduled changes are outstanding
    #[must_use]
    pub fn is_busy(&self) -> bool {
        !self.pending.is_empty()
    }

    fn last_due(&self) -> Option<Instant> {
        self.pending.iter().map(|(due, _)| *due).max()
    }

    /// Apply every scheduled change that is due
    fn settle(&mut self) {
        loop {
            let now = Instant::now();
            let Some(pos) = self
                .pending
                .iter()
                .enumerate()
                .filter(|(_, (due, _))| *due <= now)
                .min_by_key(|(_, (due, _))| *due)
                .map(|(i, _)| i)
            else {
                break;
            };
            let (_, reaction) = self.pending.remove(pos);
            reaction(self);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Trigger {
    Click(String),
    Fill(String),
    Key(String, String),
}

/// Mock driver for unit and workflow tests
pub struct MockDriver {
    state: Mutex<MockState>,
    pages: Mutex<Vec<(UrlPattern, Reaction)>>,
    reactions: Mutex<HashMap<Trigger, Reaction>>,
    history: Mutex<Vec<String>>,
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDriver")
            .field("state", &*lock(&self.state))
            .field("history", &lock(&self.history).len())
            .finish()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockDriver {
    /// Create new mock driver on `about:blank`
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            pages: Mutex::new(Vec::new()),
            reactions: Mutex::new(HashMap::new()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Render a page whenever a URL matching `pattern` is loaded
    pub fn on_page(&self, pattern: UrlPattern, render: impl Fn(&mut MockState) + Send + Sync + 'static) {
        lock(&self.pages).push((pattern, Arc::new(render)));
    }

    /// React to clicks on the element with `key`
    pub fn on_click(&self, key: &str, reaction: impl Fn(&mut MockState) + Send + Sync + 'static) {
        lock(&self.reactions).insert(Trigger::Click(key.to_string()), Arc::new(reaction));
    }

    /// React to fills of the element with `key`
    pub fn on_fill(&self, key: &str, reaction: impl Fn(&mut MockState) + Send + Sync + 'static) {
        lock(&self.reactions).insert(Trigger::Fill(key.to_string()), Arc::new(reaction));
    }

    /// React to `key_name` pressed while the element with `key` has focus
    pub fn on_key(
        &self,
        key: &str,
        key_name: &str,
        reaction: impl Fn(&mut MockState) + Send + Sync + 'static,
    ) {
        lock(&self.reactions).insert(
            Trigger::Key(key.to_string(), key_name.to_string()),
            Arc::new(reaction),
        );
    }

    /// Inspect or mutate the page model directly
    pub fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = lock(&self.state);
        state.settle();
        f(&mut state)
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        lock(&self.history).clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        lock(&self.history).iter().any(|c| c.starts_with(method))
    }

    /// Number of calls whose entry starts with `prefix`
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        lock(&self.history)
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, entry: String) {
        lock(&self.history).push(entry);
    }

    fn reaction(&self, trigger: &Trigger) -> Option<Reaction> {
        lock(&self.reactions).get(trigger).cloned()
    }

    fn not_found(locator: &Locator) -> SuiteError {
        SuiteError::ElementNotFound {
            selector: locator.to_string(),
        }
    }

    fn with_target<R>(
        &self,
        locator: &Locator,
        f: impl FnOnce(&MockElement) -> R,
    ) -> SuiteResult<R> {
        self.with_state(|s| s.target(locator).map(f))
            .ok_or_else(|| Self::not_found(locator))
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn goto(&self, url: &str) -> SuiteResult<()> {
        self.record(format!("goto:{url}"));
        let renders: Vec<Reaction> = lock(&self.pages)
            .iter()
            .filter(|(pattern, _)| pattern.matches(url))
            .map(|(_, render)| Arc::clone(render))
            .collect();
        self.with_state(|s| {
            s.url = url.to_string();
            s.title.clear();
            s.elements.clear();
            s.pending.clear();
            s.focused = None;
            for render in &renders {
                render(s);
            }
        });
        Ok(())
    }

    async fn current_url(&self) -> SuiteResult<String> {
        Ok(self.with_state(|s| s.url.clone()))
    }

    async fn title(&self) -> SuiteResult<String> {
        Ok(self.with_state(|s| s.title.clone()))
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> SuiteResult<()> {
        self.record(format!("wait_for_load_state:{state}"));
        if state != LoadState::NetworkIdle {
            return Ok(());
        }
        let deadline = Instant::now() + timeout;
        while let Some(due) = self.with_state(|s| s.last_due()) {
            if due > deadline {
                return Err(SuiteError::Timeout {
                    ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    waiting_for: format!("{state}"),
                });
            }
            tokio::time::sleep_until(due).await;
        }
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> SuiteResult<usize> {
        Ok(self.with_state(|s| s.find(locator).len()))
    }

    async fn is_visible(&self, locator: &Locator) -> SuiteResult<bool> {
        Ok(self.with_state(|s| s.target(locator).is_some_and(|e| e.visible)))
    }

    async fn is_enabled(&self, locator: &Locator) -> SuiteResult<bool> {
        self.with_target(locator, |e| e.enabled)
    }

    async fn input_value(&self, locator: &Locator) -> SuiteResult<String> {
        self.with_target(locator, |e| e.value.clone())
    }

    async fn text_content(&self, locator: &Locator) -> SuiteResult<String> {
        self.with_target(locator, |e| e.text.clone())
    }

    async fn class_name(&self, locator: &Locator) -> SuiteResult<String> {
        self.with_target(locator, |e| e.classes.join(" "))
    }

    async fn click(&self, locator: &Locator) -> SuiteResult<()> {
        self.record(format!("click:{locator}"));
        let (key, visible, enabled) =
            self.with_target(locator, |e| (e.key.clone(), e.visible, e.enabled))?;
        if !visible {
            return Err(SuiteError::page(format!("{locator} is not visible")));
        }
        let reaction = self.reaction(&Trigger::Click(key.clone()));
        self.with_state(|s| {
            s.focused = Some(key);
            if let (true, Some(reaction)) = (enabled, reaction) {
                reaction(s);
            }
        });
        Ok(())
    }

    async fn focus(&self, locator: &Locator) -> SuiteResult<()> {
        self.record(format!("focus:{locator}"));
        let key = self.with_target(locator, |e| e.key.clone())?;
        self.with_state(|s| s.focused = Some(key));
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> SuiteResult<()> {
        self.record(format!("fill:{locator}={value}"));
        let (key, enabled) = self.with_target(locator, |e| (e.key.clone(), e.enabled))?;
        if !enabled {
            return Err(SuiteError::page(format!("{locator} is disabled")));
        }
        let reaction = self.reaction(&Trigger::Fill(key.clone()));
        self.with_state(|s| {
            if let Some(element) = s.element_mut(&key) {
                element.value = value.to_string();
            }
            s.focused = Some(key);
            if let Some(reaction) = reaction {
                reaction(s);
            }
        });
        Ok(())
    }

    async fn press(&self, key: &str) -> SuiteResult<()> {
        self.record(format!("press:{key}"));
        let Some(focused) = self.with_state(|s| s.focused.clone()) else {
            return Ok(());
        };
        if let Some(reaction) = self.reaction(&Trigger::Key(focused, key.to_string())) {
            self.with_state(|s| reaction(s));
        }
        Ok(())
    }

    async fn set_viewport(&self, viewport: Viewport) -> SuiteResult<()> {
        self.record(format!("set_viewport:{}x{}", viewport.width, viewport.height));
        self.with_state(|s| s.viewport = viewport);
        Ok(())
    }

    async fn clear_cookies(&self) -> SuiteResult<()> {
        self.record("clear_cookies".to_string());
        self.with_state(|s| s.storage.cookies.clear());
        Ok(())
    }

    async fn clear_web_storage(&self) -> SuiteResult<()> {
        self.record("clear_web_storage".to_string());
        self.with_state(|s| {
            let origin = origin_of(&s.url);
            s.storage.local_storage.remove(&origin);
            s.storage.session_storage.remove(&origin);
        });
        Ok(())
    }

    async fn storage_state(&self) -> SuiteResult<StorageState> {
        Ok(self.with_state(|s| s.storage.clone()))
    }

    async fn apply_storage_state(&self, state: &StorageState) -> SuiteResult<()> {
        self.record("apply_storage_state".to_string());
        self.with_state(|s| {
            for cookie in &state.cookies {
                s.storage.cookies.retain(|c| c.name != cookie.name);
                s.storage.cookies.push(cookie.clone());
            }
            for (origin, items) in &state.local_storage {
                s.storage
                    .local_storage
                    .entry(origin.clone())
                    .or_default()
                    .extend(items.clone());
            }
            for (origin, items) in &state.session_storage {
                s.storage
                    .session_storage
                    .entry(origin.clone())
                    .or_default()
                    .extend(items.clone());
            }
        });
        Ok(())
    }

    async fn route(&self, rule: RouteRule) -> SuiteResult<()> {
        self.record(format!("route:{}", rule.pattern));
        self.with_state(|s| s.routes.push(rule));
        Ok(())
    }

    async fn screenshot(&self) -> SuiteResult<Vec<u8>> {
        self.record("screenshot".to_string());
        Ok(PNG_SIGNATURE.to_vec())
    }
}
