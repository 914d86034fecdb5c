//! Tracing subscriber setup shared by the harness and the CLI.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// `CERTGEM_LOG_FORMAT=json` selects JSON, anything else the default
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var("CERTGEM_LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Filter from `RUST_LOG`, falling back to `default_directive`
#[must_use]
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install the global subscriber once; later calls are no-ops.
///
/// Test binaries call this from every test, and another subscriber may
/// already be installed, so a failed `try_init` is ignored.
pub fn init(default_directive: &str, format: LogFormat) {
    INIT.get_or_init(|| {
        let registry = tracing_subscriber::registry().with(env_filter(default_directive));
        let result = match format {
            LogFormat::Pretty => registry
                .with(fmt::layer().with_target(false).with_test_writer().compact())
                .try_init(),
            LogFormat::Json => registry
                .with(fmt::layer().json().with_current_span(false))
                .try_init(),
        };
        if result.is_ok() {
            tracing::debug!(?format, "logging initialized");
        }
    });
}

/// [`init`] with level `info` and the format chosen by the environment
pub fn init_default() {
    init("info", LogFormat::from_env());
}
