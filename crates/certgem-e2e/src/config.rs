//! Suite configuration.
//!
//! Defaults mirror the portal's local development setup. An optional YAML
//! file (`certgem.yaml`) overrides them, and environment variables override
//! the file.

use crate::driver::Viewport;
use crate::result::{SuiteError, SuiteResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name
pub const CONFIG_FILE: &str = "certgem.yaml";

/// Default origin of the portal
pub const DEFAULT_BASE_URL: &str = "http://localhost:4200";

/// Suite configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    /// Origin of the application under test, without trailing slash
    pub base_url: String,
    /// Where the setup flow writes the authentication snapshot
    pub auth_state_path: PathBuf,
    /// Run the browser without a window
    pub headless: bool,
    /// Browser viewport
    pub viewport: Viewport,
    /// Upper bound for one test attempt
    pub test_timeout_ms: u64,
    /// Default timeout of expectations
    pub expect_timeout_ms: u64,
    /// Default timeout of actions
    pub action_timeout_ms: u64,
    /// Extra attempts after a failure
    pub retries: u32,
    /// Parallel test threads (`None` lets the runner decide)
    pub workers: Option<usize>,
    /// Screenshots and other failure artifacts
    pub artifacts_dir: PathBuf,
    /// Capture a screenshot when a test fails
    pub screenshot_on_failure: bool,
    /// Chromium executable, auto-detected when unset
    pub chromium_path: Option<PathBuf>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_state_path: PathBuf::from("auth.json"),
            headless: true,
            viewport: Viewport::desktop(),
            test_timeout_ms: 30_000,
            expect_timeout_ms: 10_000,
            action_timeout_ms: 5_000,
            retries: 0,
            workers: None,
            artifacts_dir: PathBuf::from("target/certgem"),
            screenshot_on_failure: true,
            chromium_path: None,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> SuiteResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SuiteError::config(format!(
            "{key} must be a boolean, got {other:?}"
        ))),
    }
}

impl SuiteConfig {
    /// Parse a YAML document; missing keys keep their defaults
    pub fn from_yaml(yaml: &str) -> SuiteResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML file
    pub fn from_file(path: &Path) -> SuiteResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Defaults, then `certgem.yaml` in `dir` if present, then the process
    /// environment
    pub fn load_from_dir(dir: &Path) -> SuiteResult<Self> {
        let path = dir.join(CONFIG_FILE);
        let config = if path.is_file() {
            tracing::debug!(path = %path.display(), "loading suite configuration");
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    /// [`SuiteConfig::load_from_dir`] on the working directory
    pub fn load() -> SuiteResult<Self> {
        Self::load_from_dir(Path::new("."))
    }

    /// Apply environment overrides read through `var`.
    ///
    /// `CI` switches to one worker and two retries before the explicit
    /// `CERTGEM_*` variables are applied.
    pub fn with_env(mut self, var: impl Fn(&str) -> Option<String>) -> SuiteResult<Self> {
        if var("CI").is_some_and(|v| !v.is_empty() && v != "0" && v != "false") {
            self.retries = 2;
            self.workers = Some(1);
        }
        if let Some(url) = var("CERTGEM_BASE_URL") {
            self.base_url = url;
        }
        if let Some(path) = var("CERTGEM_AUTH_STATE") {
            self.auth_state_path = PathBuf::from(path);
        }
        if let Some(headless) = var("CERTGEM_HEADLESS") {
            self.headless = parse_bool("CERTGEM_HEADLESS", &headless)?;
        }
        if let Some(retries) = var("CERTGEM_RETRIES") {
            self.retries = retries.trim().parse().map_err(|_| {
                SuiteError::config(format!("CERTGEM_RETRIES must be a number, got {retries:?}"))
            })?;
        }
        if let Some(path) = var("CHROMIUM_PATH") {
            self.chromium_path = Some(PathBuf::from(path));
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject configurations no run could use
    pub fn validate(&self) -> SuiteResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(SuiteError::config(format!(
                "base_url must be an http(s) origin, got {:?}",
                self.base_url
            )));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(SuiteError::config("viewport must be non-empty"));
        }
        if self.workers == Some(0) {
            return Err(SuiteError::config("workers must be at least 1"));
        }
        Ok(())
    }

    /// Absolute URL of an application route such as `/login`
    #[must_use]
    pub fn url(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }

    /// Expectation timeout
    #[must_use]
    pub const fn expect_timeout(&self) -> Duration {
        Duration::from_millis(self.expect_timeout_ms)
    }

    /// Action timeout
    #[must_use]
    pub const fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    /// Per-attempt test timeout
    #[must_use]
    pub const fn test_timeout(&self) -> Duration {
        Duration::from_millis(self.test_timeout_ms)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> SuiteResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = SuiteConfig::default();
            assert_eq!(config.base_url, "http://localhost:4200");
            assert_eq!(config.auth_state_path, PathBuf::from("auth.json"));
            assert!(config.headless);
            assert_eq!(config.viewport, Viewport::new(1920, 1080));
            assert_eq!(config.test_timeout(), Duration::from_secs(30));
            assert_eq!(config.expect_timeout(), Duration::from_secs(10));
            assert_eq!(config.action_timeout(), Duration::from_secs(5));
            assert_eq!(config.retries, 0);
            assert_eq!(config.workers, None);
            assert!(config.screenshot_on_failure);
        }

        #[test]
        fn test_url_joins_routes() {
            let config = SuiteConfig::default();
            assert_eq!(config.url("/login"), "http://localhost:4200/login");
            assert_eq!(config.url("welcome"), "http://localhost:4200/welcome");
            assert_eq!(
                config.url("/certificate?id=52"),
                "http://localhost:4200/certificate?id=52"
            );
        }
    }

    mod yaml_tests {
        use super::*;

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let config = SuiteConfig::from_yaml(
                "base_url: https://certgem.example\nviewport:\n  width: 1280\n  height: 720\n",
            )
            .unwrap();
            assert_eq!(config.base_url, "https://certgem.example");
            assert_eq!(config.viewport, Viewport::new(1280, 720));
            assert_eq!(config.expect_timeout_ms, 10_000);
        }

        #[test]
        fn test_unknown_key_rejected() {
            assert!(matches!(
                SuiteConfig::from_yaml("base_ur: http://x\n"),
                Err(SuiteError::Yaml(_))
            ));
        }

        #[test]
        fn test_bad_base_url_rejected() {
            let err = SuiteConfig::from_yaml("base_url: localhost:4200\n").unwrap_err();
            assert!(matches!(err, SuiteError::Config { .. }));
        }

        #[test]
        fn test_yaml_round_trip() {
            let config = SuiteConfig::default();
            let yaml = config.to_yaml().unwrap();
            assert!(yaml.contains("base_url: http://localhost:4200"));
            assert_eq!(SuiteConfig::from_yaml(&yaml).unwrap(), config);
        }

        #[test]
        fn test_from_file() {
            let dir = TempDir::new().unwrap();
            std::fs::write(dir.path().join(CONFIG_FILE), "retries: 1\nheadless: false\n").unwrap();
            let config = SuiteConfig::from_file(&dir.path().join(CONFIG_FILE)).unwrap();
            assert_eq!(config.retries, 1);
            assert!(!config.headless);
        }
    }

    mod env_tests {
        use super::*;

        #[test]
        fn test_ci_profile() {
            let config = SuiteConfig::default().with_env(env(&[("CI", "true")])).unwrap();
            assert_eq!(config.retries, 2);
            assert_eq!(config.workers, Some(1));
        }

        #[test]
        fn test_ci_false_is_ignored() {
            let config = SuiteConfig::default().with_env(env(&[("CI", "false")])).unwrap();
            assert_eq!(config.retries, 0);
        }

        #[test]
        fn test_explicit_overrides_beat_ci() {
            let config = SuiteConfig::default()
                .with_env(env(&[
                    ("CI", "1"),
                    ("CERTGEM_RETRIES", "5"),
                    ("CERTGEM_BASE_URL", "http://portal:8080"),
                    ("CERTGEM_AUTH_STATE", "state/auth.json"),
                    ("CERTGEM_HEADLESS", "no"),
                    ("CHROMIUM_PATH", "/usr/bin/chromium"),
                ]))
                .unwrap();
            assert_eq!(config.retries, 5);
            assert_eq!(config.base_url, "http://portal:8080");
            assert_eq!(config.auth_state_path, PathBuf::from("state/auth.json"));
            assert!(!config.headless);
            assert_eq!(config.chromium_path, Some(PathBuf::from("/usr/bin/chromium")));
        }

        #[test]
        fn test_invalid_env_values() {
            assert!(SuiteConfig::default()
                .with_env(env(&[("CERTGEM_RETRIES", "many")]))
                .is_err());
            assert!(SuiteConfig::default()
                .with_env(env(&[("CERTGEM_HEADLESS", "maybe")]))
                .is_err());
        }
    }
}
