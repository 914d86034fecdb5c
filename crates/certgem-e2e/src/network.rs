//! Network interception.
//!
//! Route rules pair a URL pattern with an action. The gemologists screen is
//! the only consumer: its backend call is aborted to exercise the error toast
//! and delayed to observe the loading indicator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Backend endpoint behind the gemologists listing
pub const GEMOLOGISTS_ENDPOINT: &str = "**/usuario/gemologos";

/// Abort reason for network requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AbortReason {
    /// Request failed
    #[default]
    Failed,
    /// Request was aborted
    Aborted,
    /// Request timed out
    TimedOut,
    /// Access was denied
    AccessDenied,
    /// Connection was refused
    ConnectionRefused,
    /// Connection was reset
    ConnectionReset,
    /// Internet is disconnected
    InternetDisconnected,
    /// DNS name could not be resolved
    NameNotResolved,
    /// Request was blocked by client
    BlockedByClient,
}

impl AbortReason {
    /// Get the error message for this abort reason
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Failed => "net::ERR_FAILED",
            Self::Aborted => "net::ERR_ABORTED",
            Self::TimedOut => "net::ERR_TIMED_OUT",
            Self::AccessDenied => "net::ERR_ACCESS_DENIED",
            Self::ConnectionRefused => "net::ERR_CONNECTION_REFUSED",
            Self::ConnectionReset => "net::ERR_CONNECTION_RESET",
            Self::InternetDisconnected => "net::ERR_INTERNET_DISCONNECTED",
            Self::NameNotResolved => "net::ERR_NAME_NOT_RESOLVED",
            Self::BlockedByClient => "net::ERR_BLOCKED_BY_CLIENT",
        }
    }
}

/// URL pattern for matching requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Prefix match
    Prefix(String),
    /// Contains substring
    Contains(String),
    /// Regex match
    Regex(String),
    /// Glob pattern (e.g., "**/usuario/gemologos")
    Glob(String),
    /// Match any URL
    Any,
}

impl UrlPattern {
    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Prefix(pattern) => url.starts_with(pattern),
            Self::Contains(pattern) => url.contains(pattern),
            Self::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(url))
                .unwrap_or(false),
            Self::Glob(pattern) => glob_matches(pattern, url),
            Self::Any => true,
        }
    }

    /// Wildcard pattern understood by the CDP Fetch domain.
    ///
    /// Regex patterns cannot be expressed there, so they intercept everything
    /// and are filtered again with [`UrlPattern::matches`].
    #[must_use]
    pub fn fetch_pattern(&self) -> String {
        match self {
            Self::Exact(url) => url.clone(),
            Self::Prefix(prefix) => format!("{prefix}*"),
            Self::Contains(part) => format!("*{part}*"),
            Self::Glob(glob) => glob.replace("**", "*"),
            Self::Regex(_) | Self::Any => "*".to_string(),
        }
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "{p}"),
            Self::Prefix(p) => write!(f, "{p}*"),
            Self::Contains(p) => write!(f, "*{p}*"),
            Self::Regex(p) => write!(f, "/{p}/"),
            Self::Glob(p) => write!(f, "{p}"),
            Self::Any => write!(f, "*"),
        }
    }
}

/// Glob matching for URLs: `*` spans any run of characters, `/` included.
fn glob_matches(pattern: &str, url: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    let (Some(first), Some(last)) = (parts.first(), parts.last()) else {
        return url.is_empty();
    };
    if parts.len() == 1 {
        return url == pattern;
    }
    if !url.starts_with(first) || url.len() < first.len() + last.len() {
        return false;
    }
    if !url[first.len()..].ends_with(last) {
        return false;
    }

    let middle_end = url.len() - last.len();
    let mut pos = first.len();
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match url[pos..middle_end].find(part) {
            Some(found) => pos += found + part.len(),
            None => return false,
        }
    }
    true
}

/// Action to take when a route matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteAction {
    /// Fail the request with a network error
    Abort(AbortReason),
    /// Hold the request for the given milliseconds, then let it through
    Delay(u64),
    /// Let the request through untouched
    Continue,
}

impl RouteAction {
    /// Delay before the request continues, if any
    #[must_use]
    pub const fn delay(&self) -> Option<Duration> {
        match self {
            Self::Delay(ms) => Some(Duration::from_millis(*ms)),
            _ => None,
        }
    }
}

/// A route rule: requests matching `pattern` receive `action`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    /// Which requests to intercept
    pub pattern: UrlPattern,
    /// What to do with them
    pub action: RouteAction,
}

impl RouteRule {
    /// Create a new route rule
    #[must_use]
    pub const fn new(pattern: UrlPattern, action: RouteAction) -> Self {
        Self { pattern, action }
    }

    /// Abort requests matching a glob
    #[must_use]
    pub fn abort(glob: impl Into<String>) -> Self {
        Self::new(
            UrlPattern::Glob(glob.into()),
            RouteAction::Abort(AbortReason::Failed),
        )
    }

    /// Delay requests matching a glob
    #[must_use]
    pub fn delay(glob: impl Into<String>, ms: u64) -> Self {
        Self::new(UrlPattern::Glob(glob.into()), RouteAction::Delay(ms))
    }

    /// Whether the rule applies to `url`
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        self.pattern.matches(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod url_pattern_tests {
        use super::*;

        #[test]
        fn test_exact_and_prefix() {
            let url = "http://localhost:4200/welcome";
            assert!(UrlPattern::Exact(url.to_string()).matches(url));
            assert!(!UrlPattern::Exact(url.to_string()).matches("http://localhost:4200/login"));
            assert!(UrlPattern::Prefix("http://localhost:4200/".to_string()).matches(url));
        }

        #[test]
        fn test_regex() {
            let pattern = UrlPattern::Regex(r"/certificate(\?.*)?$".to_string());
            assert!(pattern.matches("http://localhost:4200/certificate?id=52"));
            assert!(!pattern.matches("http://localhost:4200/welcome"));
        }

        #[test]
        fn test_invalid_regex_never_matches() {
            assert!(!UrlPattern::Regex("(".to_string()).matches("anything"));
        }

        #[test]
        fn test_gemologists_glob() {
            let pattern = UrlPattern::Glob(GEMOLOGISTS_ENDPOINT.to_string());
            assert!(pattern.matches("http://localhost:8080/usuario/gemologos"));
            assert!(pattern.matches("http://api.local/v1/usuario/gemologos"));
            assert!(!pattern.matches("http://localhost:8080/usuario/gemologos/3"));
            assert!(!pattern.matches("http://localhost:8080/usuario/certificados"));
        }

        #[test]
        fn test_glob_repeated_segment() {
            let pattern = UrlPattern::Glob("**/gemologos".to_string());
            assert!(pattern.matches("http://x/gemologos/usuario/gemologos"));
        }

        #[test]
        fn test_glob_without_wildcard_is_exact() {
            let pattern = UrlPattern::Glob("http://x/a".to_string());
            assert!(pattern.matches("http://x/a"));
            assert!(!pattern.matches("http://x/ab"));
        }

        #[test]
        fn test_fetch_pattern() {
            assert_eq!(
                UrlPattern::Glob(GEMOLOGISTS_ENDPOINT.to_string()).fetch_pattern(),
                "*/usuario/gemologos"
            );
            assert_eq!(UrlPattern::Regex("x".to_string()).fetch_pattern(), "*");
            assert_eq!(UrlPattern::Contains("api".to_string()).fetch_pattern(), "*api*");
        }
    }

    mod route_tests {
        use super::*;

        #[test]
        fn test_abort_rule() {
            let rule = RouteRule::abort(GEMOLOGISTS_ENDPOINT);
            assert_eq!(rule.action, RouteAction::Abort(AbortReason::Failed));
            assert!(rule.matches("http://localhost:8080/usuario/gemologos"));
            assert_eq!(AbortReason::Failed.message(), "net::ERR_FAILED");
        }

        #[test]
        fn test_delay_rule() {
            let rule = RouteRule::delay(GEMOLOGISTS_ENDPOINT, 500);
            assert_eq!(rule.action.delay(), Some(Duration::from_millis(500)));
            assert_eq!(RouteAction::Continue.delay(), None);
        }

        #[test]
        fn test_rule_serializes() {
            let rule = RouteRule::delay("**/api", 250);
            let json = serde_json::to_string(&rule).unwrap();
            let back: RouteRule = serde_json::from_str(&json).unwrap();
            assert_eq!(back, rule);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_double_star_prefix_matches_any_origin(
                origin in "[a-z]{1,12}",
                port in 1u16..,
                path in "[a-z]{1,8}(/[a-z]{1,8}){0,3}"
            ) {
                let url = format!("http://{origin}:{port}/{path}/usuario/gemologos");
                prop_assert!(UrlPattern::Glob(GEMOLOGISTS_ENDPOINT.to_string()).matches(&url));
            }

            #[test]
            fn prop_suffix_mismatch_never_matches(
                path in "[a-z]{1,8}",
                tail in "[a-z]{1,6}"
            ) {
                let url = format!("http://localhost/{path}/usuario/gemologos{tail}");
                prop_assert!(!UrlPattern::Glob(GEMOLOGISTS_ENDPOINT.to_string()).matches(&url));
            }

            #[test]
            fn prop_any_matches_everything(url in ".*") {
                prop_assert!(UrlPattern::Any.matches(&url));
            }
        }
    }
}
