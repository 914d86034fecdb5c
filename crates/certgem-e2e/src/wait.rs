//! Wait mechanisms.
//!
//! Playwright-style synchronization for an async page driver: every action
//! and expectation polls its condition until it holds or a bounded timeout
//! elapses. Time is read from `tokio::time` so tests can run with paused time.

use crate::result::{SuiteError, SuiteResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for actions such as click and fill (5 seconds)
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 5_000;

/// Default timeout for expectations (10 seconds)
pub const DEFAULT_EXPECT_TIMEOUT_MS: u64 = 10_000;

/// Timeout for each probe of a credentials error message (2 seconds)
pub const CREDENTIAL_PROBE_TIMEOUT_MS: u64 = 2_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Network idle threshold (500ms without requests)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

// =============================================================================
// LOAD STATE
// =============================================================================

/// Page load states (Playwright parity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// Wait for the `load` event to fire
    #[default]
    Load,
    /// Wait for `DOMContentLoaded` event
    DomContentLoaded,
    /// Wait for network to be idle (no requests for 500ms)
    NetworkIdle,
}

impl LoadState {
    /// Get the JavaScript event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::NetworkIdle => "networkidle",
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_EXPECT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options bounded by `timeout`
    #[must_use]
    pub fn within(timeout: Duration) -> Self {
        Self::default().with_timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Outcome of a successful wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// How long the wait took
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

/// Poll `probe` until it yields a value or the timeout elapses.
///
/// The probe runs at least once, even with a zero timeout. Errors from the
/// probe abort the wait immediately.
///
/// # Errors
///
/// Returns [`SuiteError::Timeout`] when no value was produced in time, or the
/// first error the probe returned.
pub async fn poll_value<T, F, Fut>(
    options: WaitOptions,
    waiting_for: &str,
    mut probe: F,
) -> SuiteResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SuiteResult<Option<T>>>,
{
    let start = Instant::now();
    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        if start.elapsed() >= options.timeout() {
            return Err(SuiteError::Timeout {
                ms: options.timeout_ms,
                waiting_for: waiting_for.to_string(),
            });
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Poll a boolean condition until it holds.
///
/// # Errors
///
/// Same as [`poll_value`].
pub async fn poll_until<F, Fut>(
    options: WaitOptions,
    waiting_for: &str,
    mut condition: F,
) -> SuiteResult<WaitResult>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SuiteResult<bool>>,
{
    let start = Instant::now();
    poll_value(options, waiting_for, || {
        let fut = condition();
        async move { Ok(fut.await?.then_some(())) }
    })
    .await?;
    Ok(WaitResult {
        elapsed: start.elapsed(),
        waited_for: waiting_for.to_string(),
    })
}

/// Fixed pause, the equivalent of `waitForTimeout`
pub async fn wait_timeout(duration_ms: u64) {
    tokio::time::sleep(Duration::from_millis(duration_ms)).await;
}
