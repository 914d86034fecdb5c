//! Per-test lifecycle: fresh page, storage precondition, timeout, retries and
//! a screenshot of the failing page.

use crate::config::SuiteConfig;
use crate::context::{AuthSnapshot, StorageState};
use crate::driver::PageDriver;
use crate::logging;
use crate::pages::{CertificatesPage, GemologistsPage, LoginPage};
use crate::result::{SuiteError, SuiteResult};
use std::fmt;
use std::future::Future;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use uuid::Uuid;

/// Storage a test needs before its body runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StorageRequirement {
    /// Fresh, unauthenticated page
    #[default]
    None,
    /// Restore the authentication snapshot named by the config
    Authenticated,
}

impl StorageRequirement {
    /// Resolve the precondition; a missing snapshot fails here, before any attempt
    pub fn resolve(&self, config: &SuiteConfig) -> SuiteResult<Option<StorageState>> {
        match self {
            Self::None => Ok(None),
            Self::Authenticated => AuthSnapshot::new(&config.auth_state_path)
                .require()
                .map(Some),
        }
    }
}

/// What a test body gets
#[derive(Clone)]
pub struct TestContext {
    /// Test name
    pub name: String,
    /// Zero-based attempt number
    pub attempt: u32,
    /// Effective configuration
    pub config: SuiteConfig,
    driver: Arc<dyn PageDriver>,
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("name", &self.name)
            .field("attempt", &self.attempt)
            .field("driver", &self.driver.name())
            .finish()
    }
}

impl TestContext {
    /// The page under test
    #[must_use]
    pub fn driver(&self) -> Arc<dyn PageDriver> {
        Arc::clone(&self.driver)
    }

    /// Login page object on this page
    #[must_use]
    pub fn login_page(&self) -> LoginPage {
        LoginPage::new(self.driver(), self.config.clone())
    }

    /// Certificates page object on this page
    #[must_use]
    pub fn certificates_page(&self) -> CertificatesPage {
        CertificatesPage::new(self.driver(), self.config.clone())
    }

    /// Gemologists page object on this page
    #[must_use]
    pub fn gemologists_page(&self) -> GemologistsPage {
        GemologistsPage::new(self.driver(), self.config.clone())
    }
}

/// Outcome of one test across its attempts
#[derive(Debug)]
pub struct TestReport {
    /// Test name
    pub name: String,
    /// Attempts made, including the passing one
    pub attempts: u32,
    /// Wall time over all attempts
    pub duration: Duration,
    /// Screenshots of failed attempts
    pub screenshots: Vec<PathBuf>,
    /// Error of the last attempt, if it failed
    pub error: Option<SuiteError>,
}

impl TestReport {
    /// The last attempt succeeded
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.error.is_none()
    }

    /// `Err` with the last attempt's error when the test failed
    pub fn into_result(self) -> SuiteResult<()> {
        match self.error {
            None => Ok(()),
            Some(error) => Err(error),
        }
    }
}

/// Number of tests allowed to run at once: `workers`, else the machine's
/// available parallelism
#[must_use]
pub fn worker_count(config: &SuiteConfig) -> usize {
    config.workers.unwrap_or_else(|| {
        std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
    })
}

/// Runs test bodies against pages produced by a factory.
///
/// Clones share one pool of [`worker_count`] slots; each test holds a slot
/// for its whole run.
#[derive(Debug, Clone)]
pub struct TestRunner {
    config: SuiteConfig,
    slots: Arc<Semaphore>,
}

impl TestRunner {
    /// Runner over `config`; installs the log subscriber
    #[must_use]
    pub fn new(config: SuiteConfig) -> Self {
        logging::init_default();
        let slots = Arc::new(Semaphore::new(worker_count(&config)));
        Self { config, slots }
    }

    /// Share the slot pool of another runner
    #[must_use]
    pub fn with_slots(mut self, slots: Arc<Semaphore>) -> Self {
        self.slots = slots;
        self
    }

    /// Wait for a free worker slot
    pub async fn acquire_slot(&self) -> SuiteResult<OwnedSemaphorePermit> {
        Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| SuiteError::page("worker pool closed"))
    }

    /// Configuration of every run
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run `body` up to `retries + 1` times, each on a fresh page, once a
    /// worker slot is free.
    ///
    /// The storage precondition is resolved once up front; a missing
    /// snapshot fails the test without any attempt. Each attempt is bounded
    /// by the test timeout.
    pub async fn run<P, PFut, B, BFut>(
        &self,
        name: &str,
        requirement: StorageRequirement,
        new_page: P,
        body: B,
    ) -> TestReport
    where
        P: FnMut() -> PFut,
        PFut: Future<Output = SuiteResult<Arc<dyn PageDriver>>>,
        B: FnMut(TestContext) -> BFut,
        BFut: Future<Output = SuiteResult<()>>,
    {
        let _slot = match self.acquire_slot().await {
            Ok(slot) => slot,
            Err(error) => {
                return TestReport {
                    name: name.to_string(),
                    attempts: 0,
                    duration: Duration::ZERO,
                    screenshots: Vec::new(),
                    error: Some(error),
                }
            }
        };
        self.run_attempts(name, requirement, new_page, body).await
    }

    async fn run_attempts<P, PFut, B, BFut>(
        &self,
        name: &str,
        requirement: StorageRequirement,
        mut new_page: P,
        mut body: B,
    ) -> TestReport
    where
        P: FnMut() -> PFut,
        PFut: Future<Output = SuiteResult<Arc<dyn PageDriver>>>,
        B: FnMut(TestContext) -> BFut,
        BFut: Future<Output = SuiteResult<()>>,
    {
        let start = Instant::now();
        let mut report = TestReport {
            name: name.to_string(),
            attempts: 0,
            duration: Duration::ZERO,
            screenshots: Vec::new(),
            error: None,
        };

        let storage = match requirement.resolve(&self.config) {
            Ok(storage) => storage,
            Err(error) => {
                tracing::error!(test = name, %error, "precondition not met");
                report.error = Some(error);
                return report;
            }
        };

        for attempt in 0..=self.config.retries {
            report.attempts = attempt + 1;
            tracing::info!(test = name, attempt, "running");
            match self.attempt(name, attempt, storage.as_ref(), &mut new_page, &mut body).await {
                Ok(()) => {
                    report.error = None;
                    break;
                }
                Err((error, screenshot)) => {
                    tracing::warn!(test = name, attempt, %error, "attempt failed");
                    report.screenshots.extend(screenshot);
                    report.error = Some(error);
                }
            }
        }

        report.duration = start.elapsed();
        if report.passed() {
            tracing::info!(test = name, attempts = report.attempts, "passed");
        } else {
            tracing::error!(test = name, attempts = report.attempts, "failed");
        }
        report
    }

    async fn attempt<P, PFut, B, BFut>(
        &self,
        name: &str,
        attempt: u32,
        storage: Option<&StorageState>,
        new_page: &mut P,
        body: &mut B,
    ) -> Result<(), (SuiteError, Option<PathBuf>)>
    where
        P: FnMut() -> PFut,
        PFut: Future<Output = SuiteResult<Arc<dyn PageDriver>>>,
        B: FnMut(TestContext) -> BFut,
        BFut: Future<Output = SuiteResult<()>>,
    {
        let driver = new_page().await.map_err(|e| (e, None))?;
        if let Some(state) = storage {
            driver.apply_storage_state(state).await.map_err(|e| (e, None))?;
        }

        let ctx = TestContext {
            name: name.to_string(),
            attempt,
            config: self.config.clone(),
            driver: Arc::clone(&driver),
        };
        let timeout = self.config.test_timeout();
        let outcome = match tokio::time::timeout(timeout, body(ctx)).await {
            Ok(result) => result,
            Err(_) => Err(SuiteError::Timeout {
                ms: self.config.test_timeout_ms,
                waiting_for: format!("test {name}"),
            }),
        };

        match outcome {
            Ok(()) => Ok(()),
            Err(error) => {
                let screenshot = if self.config.screenshot_on_failure {
                    self.capture(name, driver.as_ref()).await
                } else {
                    None
                };
                Err((error, screenshot))
            }
        }
    }

    /// Save a PNG of the page as `<artifacts_dir>/<name>-<uuid>.png`
    async fn capture(&self, name: &str, driver: &dyn PageDriver) -> Option<PathBuf> {
        let png = match driver.screenshot().await {
            Ok(png) => png,
            Err(error) => {
                tracing::warn!(test = name, %error, "screenshot failed");
                return None;
            }
        };
        let file = format!("{}-{}.png", artifact_stem(name), Uuid::new_v4());
        let path = self.config.artifacts_dir.join(file);
        let written = async {
            tokio::fs::create_dir_all(&self.config.artifacts_dir).await?;
            tokio::fs::write(&path, png).await
        };
        match written.await {
            Ok(()) => {
                tracing::info!(test = name, path = %path.display(), "screenshot saved");
                Some(path)
            }
            Err(error) => {
                tracing::warn!(test = name, %error, "could not write screenshot");
                None
            }
        }
    }
}

/// Test name reduced to a file-name-safe stem
fn artifact_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Run one test in Chromium: launch, fresh page per attempt, close.
///
/// Configuration comes from [`SuiteConfig::load`]. At most
/// [`worker_count`] browsers are open at once across the test binary; the
/// pool is sized by the first test that starts.
#[cfg(feature = "browser")]
pub async fn run_in_browser<B, BFut>(
    name: &str,
    requirement: StorageRequirement,
    body: B,
) -> SuiteResult<()>
where
    B: FnMut(TestContext) -> BFut,
    BFut: Future<Output = SuiteResult<()>>,
{
    use crate::browser::CdpBrowser;

    static BROWSER_SLOTS: std::sync::OnceLock<Arc<Semaphore>> = std::sync::OnceLock::new();

    let config = SuiteConfig::load()?;
    let slots = BROWSER_SLOTS.get_or_init(|| Arc::new(Semaphore::new(worker_count(&config))));
    let runner = TestRunner::new(config).with_slots(Arc::clone(slots));
    let _slot = runner.acquire_slot().await?;

    let browser = CdpBrowser::launch(runner.config()).await?;
    let launched = &browser;
    let report = runner
        .run_attempts(
            name,
            requirement,
            move || async move {
                let page = launched.new_page().await?;
                Ok(Arc::new(page) as Arc<dyn PageDriver>)
            },
            body,
        )
        .await;
    if let Err(error) = browser.close().await {
        tracing::warn!(test = name, %error, "browser did not close cleanly");
    }
    report.into_result()
}
