//! PageDriver - the browser automation seam.
//!
//! Page objects only ever talk to a `PageDriver`. Two implementations exist:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  PageDriver (async trait)                                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────────┐  ┌─────────────────────────┐  │
//! │  │  CdpDriver               │  │  MockDriver             │  │
//! │  │  (feature = "browser")   │  │  (always available)     │  │
//! │  │  chromiumoxide over CDP  │  │  in-memory page model   │  │
//! │  └──────────────────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Element operations take a [`Locator`] and resolve it on every call.
//! Single-element operations target the locator's nth match (first by
//! default) and fail with [`SuiteError::ElementNotFound`] when it is absent;
//! `is_visible` and `count` answer `false`/`0` instead.
//!
//! [`SuiteError::ElementNotFound`]: crate::result::SuiteError::ElementNotFound

use crate::context::StorageState;
use crate::locator::Locator;
use crate::network::RouteRule;
use crate::result::SuiteResult;
use crate::wait::LoadState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Browser viewport size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
}

impl Viewport {
    /// Create a viewport
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Desktop default used by the suite (1920x1080)
    #[must_use]
    pub const fn desktop() -> Self {
        Self::new(1920, 1080)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::desktop()
    }
}

/// Async browser page abstraction
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Navigate to `url` and wait for the load event
    async fn goto(&self, url: &str) -> SuiteResult<()>;

    /// Current page URL
    async fn current_url(&self) -> SuiteResult<String>;

    /// Document title
    async fn title(&self) -> SuiteResult<String>;

    /// Block until the page reaches `state` or `timeout` elapses
    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> SuiteResult<()>;

    /// Number of elements matching the locator's selector (index ignored)
    async fn count(&self, locator: &Locator) -> SuiteResult<usize>;

    /// Whether the targeted element exists and is rendered
    async fn is_visible(&self, locator: &Locator) -> SuiteResult<bool>;

    /// Whether the targeted element is enabled
    async fn is_enabled(&self, locator: &Locator) -> SuiteResult<bool>;

    /// Current `value` of an input or textarea
    async fn input_value(&self, locator: &Locator) -> SuiteResult<String>;

    /// Text content of the targeted element
    async fn text_content(&self, locator: &Locator) -> SuiteResult<String>;

    /// The element's `class` attribute
    async fn class_name(&self, locator: &Locator) -> SuiteResult<String>;

    /// Click the targeted element
    async fn click(&self, locator: &Locator) -> SuiteResult<()>;

    /// Focus the targeted element
    async fn focus(&self, locator: &Locator) -> SuiteResult<()>;

    /// Replace the element's value, firing input and change events
    async fn fill(&self, locator: &Locator, value: &str) -> SuiteResult<()>;

    /// Press a key on the focused element (e.g. "Enter")
    async fn press(&self, key: &str) -> SuiteResult<()>;

    /// Resize the viewport
    async fn set_viewport(&self, viewport: Viewport) -> SuiteResult<()>;

    /// Remove every cookie in the browser context
    async fn clear_cookies(&self) -> SuiteResult<()>;

    /// Clear local and session storage for the current origin
    async fn clear_web_storage(&self) -> SuiteResult<()>;

    /// Capture cookies and web storage
    async fn storage_state(&self) -> SuiteResult<StorageState>;

    /// Restore cookies and web storage captured earlier
    async fn apply_storage_state(&self, state: &StorageState) -> SuiteResult<()>;

    /// Install a network route; later rules take precedence
    async fn route(&self, rule: RouteRule) -> SuiteResult<()>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> SuiteResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_defaults() {
        assert_eq!(Viewport::default(), Viewport::new(1920, 1080));
        assert_eq!(Viewport::desktop().width, 1920);
    }

    #[test]
    fn test_viewport_serde_shape() {
        let json = serde_json::to_value(Viewport::new(1280, 720)).unwrap_or_default();
        assert_eq!(json["width"], 1280);
        assert_eq!(json["height"], 720);
    }
}
