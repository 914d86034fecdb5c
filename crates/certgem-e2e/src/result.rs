//! Result and error types for the CertGem suite.

use thiserror::Error;

/// Result type for suite operations
pub type SuiteResult<T> = Result<T, SuiteError>;

/// Errors that can occur while driving the portal
#[derive(Debug, Error)]
pub enum SuiteError {
    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Timed out after {ms}ms waiting for {waiting_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was being waited for
        waiting_for: String,
    },

    /// No element matched a locator
    #[error("No element matches {selector}")]
    ElementNotFound {
        /// Locator description
        selector: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Every strategy of a fallback chain failed
    #[error("{chain}: {message} (tried: {})", .attempts.join(", "))]
    FallbackExhausted {
        /// Chain name
        chain: String,
        /// Final message
        message: String,
        /// Strategies that were attempted
        attempts: Vec<String>,
    },

    /// Declared storage-state precondition is not on disk
    #[error("Authentication snapshot {path} not found; run the setup spec first")]
    SnapshotMissing {
        /// Expected path
        path: String,
    },

    /// Network interception error
    #[error("Route setup failed: {message}")]
    RouteError {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SuiteError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error is a wait that ran out of time
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = SuiteError::Timeout {
            ms: 5000,
            waiting_for: "#gemName to be visible".to_string(),
        };
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "Timed out after 5000ms waiting for #gemName to be visible"
        );
    }

    #[test]
    fn test_fallback_exhausted_lists_attempts() {
        let err = SuiteError::FallbackExhausted {
            chain: "empty-fields validation".to_string(),
            message: "no required-field validation detected".to_string(),
            attempts: vec!["button disabled".to_string(), "both messages".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("no required-field validation detected"));
        assert!(text.contains("button disabled, both messages"));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_snapshot_missing_hint() {
        let err = SuiteError::SnapshotMissing {
            path: "auth.json".to_string(),
        };
        assert!(err.to_string().contains("run the setup spec first"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SuiteError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
