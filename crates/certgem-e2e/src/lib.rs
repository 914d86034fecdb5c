//! CertGem E2E: page objects and browser specs for the CertGem portal
//!
//! The suite drives the portal's login, certificate and gemologist screens
//! through page objects. Every page talks to the browser through the
//! [`PageDriver`] seam:
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌───────────────────────────┐
//! │ Portal specs │───►│ Page objects │───►│ PageDriver                │
//! │ (tests/)     │    │ (pages/)     │    │  ├─ CdpDriver (chromium)  │
//! └──────────────┘    └──────────────┘    │  └─ MockDriver (memory)   │
//!                                         └───────────────────────────┘
//! ```
//!
//! Assertions auto-wait until a bounded timeout. Steps whose UI varies
//! between portal builds (logout, field validation, credential errors) run
//! as [`FallbackChain`]s that report which strategy satisfied them.

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod assertion;
#[cfg(feature = "browser")]
mod browser;
mod config;
mod context;
mod data;
mod driver;
mod fallback;
mod harness;
mod locator;
pub mod logging;
mod mock;
mod network;
mod page_object;
pub mod pages;
mod result;
mod wait;

pub use assertion::{
    assert_toast, expect, expect_page, normalize_whitespace, Expect, PageExpect, ToastKind,
};
#[cfg(feature = "browser")]
pub use browser::{CdpBrowser, CdpDriver};
pub use config::{SuiteConfig, CONFIG_FILE, DEFAULT_BASE_URL};
pub use context::{AuthSnapshot, Cookie, SameSite, StorageState};
pub use data::{CertificateData, Credentials, INVALID_EMAIL, INVALID_PASSWORD};
pub use driver::{PageDriver, Viewport};
pub use fallback::{Attempt, FallbackChain, Outcome};
#[cfg(feature = "browser")]
pub use harness::run_in_browser;
pub use harness::{worker_count, StorageRequirement, TestContext, TestReport, TestRunner};
pub use locator::{AriaRole, Locator, Selector};
pub use mock::{origin_of, MockDriver, MockElement, MockState, Reaction};
pub use network::{AbortReason, RouteAction, RouteRule, UrlPattern, GEMOLOGISTS_ENDPOINT};
pub use page_object::{BasePage, PageObject};
pub use pages::{CertificatesPage, ExpectedOutcome, GemologistsPage, LoginPage};
pub use result::{SuiteError, SuiteResult};
pub use wait::{
    poll_until, poll_value, wait_timeout, LoadState, WaitOptions, WaitResult,
    CREDENTIAL_PROBE_TIMEOUT_MS, DEFAULT_ACTION_TIMEOUT_MS, DEFAULT_EXPECT_TIMEOUT_MS,
    DEFAULT_POLL_INTERVAL_MS, NETWORK_IDLE_THRESHOLD_MS,
};

/// Everything a spec file usually needs
pub mod prelude {
    pub use super::assertion::*;
    #[cfg(feature = "browser")]
    pub use super::browser::*;
    pub use super::config::*;
    pub use super::context::*;
    pub use super::data::*;
    pub use super::driver::*;
    pub use super::fallback::*;
    pub use super::harness::*;
    pub use super::locator::*;
    pub use super::mock::*;
    pub use super::network::*;
    pub use super::page_object::*;
    pub use super::pages::*;
    pub use super::result::*;
    pub use super::wait::*;
}
