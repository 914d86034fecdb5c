//! Auto-retrying expectations (Playwright's `expect`).
//!
//! Each expectation polls the page until it holds or its timeout elapses, and
//! reports the last value it observed when it gives up.

use crate::driver::PageDriver;
use crate::locator::Locator;
use crate::network::UrlPattern;
use crate::result::{SuiteError, SuiteResult};
use crate::wait::{WaitOptions, DEFAULT_EXPECT_TIMEOUT_MS};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Collapse runs of whitespace and trim, as `toHaveText` does
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Poll `probe` until `accept` holds; on timeout, fail with the last observation.
///
/// A missing element counts as "not yet" rather than an error.
async fn retry<T, F, Fut>(
    options: WaitOptions,
    subject: &str,
    expectation: &str,
    mut probe: F,
    accept: impl Fn(&T) -> bool,
) -> SuiteResult<()>
where
    T: Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = SuiteResult<T>>,
{
    let start = Instant::now();
    loop {
        let last = match probe().await {
            Ok(value) if accept(&value) => return Ok(()),
            Ok(value) => format!("{value:?}"),
            Err(err @ SuiteError::ElementNotFound { .. }) => err.to_string(),
            Err(err) => return Err(err),
        };
        if start.elapsed() >= options.timeout() {
            return Err(SuiteError::assertion(format!(
                "expected {subject} {expectation} within {}ms, last observed {last}",
                options.timeout_ms
            )));
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Expectations on a single locator
#[derive(Clone)]
pub struct Expect<'a> {
    driver: &'a dyn PageDriver,
    locator: Locator,
    options: WaitOptions,
}

impl Debug for Expect<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expect")
            .field("driver", &self.driver.name())
            .field("locator", &self.locator)
            .field("options", &self.options)
            .finish()
    }
}

/// Start an expectation on `locator`, bounded by its own timeout or 10s
#[must_use]
pub fn expect<'a>(driver: &'a dyn PageDriver, locator: &Locator) -> Expect<'a> {
    let timeout = locator.timeout_or(Duration::from_millis(DEFAULT_EXPECT_TIMEOUT_MS));
    Expect {
        driver,
        locator: locator.clone(),
        options: WaitOptions::within(timeout),
    }
}

impl<'a> Expect<'a> {
    /// Override the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options = WaitOptions::within(timeout);
        self
    }

    async fn check<T, Fut>(
        &self,
        expectation: &str,
        probe: impl Fn(&'a dyn PageDriver, Locator) -> Fut,
        accept: impl Fn(&T) -> bool,
    ) -> SuiteResult<()>
    where
        T: Debug,
        Fut: Future<Output = SuiteResult<T>>,
    {
        let driver = self.driver;
        let subject = self.locator.to_string();
        retry(
            self.options,
            &subject,
            expectation,
            || probe(driver, self.locator.clone()),
            accept,
        )
        .await
    }

    /// The element exists and is rendered
    pub async fn to_be_visible(&self) -> SuiteResult<()> {
        self.check(
            "to be visible",
            |d, l| async move { d.is_visible(&l).await },
            |v: &bool| *v,
        )
        .await
    }

    /// The element is absent or not rendered
    pub async fn to_be_hidden(&self) -> SuiteResult<()> {
        self.check(
            "to be hidden",
            |d, l| async move { d.is_visible(&l).await },
            |v: &bool| !*v,
        )
        .await
    }

    /// At least one element matches, visible or not
    pub async fn to_be_attached(&self) -> SuiteResult<()> {
        self.check(
            "to be attached",
            |d, l| async move { d.count(&l).await },
            |n: &usize| *n > 0,
        )
        .await
    }

    /// The element is enabled
    pub async fn to_be_enabled(&self) -> SuiteResult<()> {
        self.check(
            "to be enabled",
            |d, l| async move { d.is_enabled(&l).await },
            |v: &bool| *v,
        )
        .await
    }

    /// The element is disabled
    pub async fn to_be_disabled(&self) -> SuiteResult<()> {
        self.check(
            "to be disabled",
            |d, l| async move { d.is_enabled(&l).await },
            |v: &bool| !*v,
        )
        .await
    }

    /// The input's value equals `expected` exactly
    pub async fn to_have_value(&self, expected: &str) -> SuiteResult<()> {
        self.check(
            &format!("to have value {expected:?}"),
            |d, l| async move { d.input_value(&l).await },
            |v: &String| v == expected,
        )
        .await
    }

    /// The element's whitespace-normalized text equals `expected`
    pub async fn to_have_text(&self, expected: &str) -> SuiteResult<()> {
        let wanted = normalize_whitespace(expected);
        self.check(
            &format!("to have text {expected:?}"),
            |d, l| async move { d.text_content(&l).await },
            |v: &String| normalize_whitespace(v) == wanted,
        )
        .await
    }

    /// The element's text contains `fragment`
    pub async fn to_contain_text(&self, fragment: &str) -> SuiteResult<()> {
        self.check(
            &format!("to contain text {fragment:?}"),
            |d, l| async move { d.text_content(&l).await },
            |v: &String| v.contains(fragment),
        )
        .await
    }

    /// Exactly `n` elements match
    pub async fn to_have_count(&self, n: usize) -> SuiteResult<()> {
        self.check(
            &format!("to have count {n}"),
            |d, l| async move { d.count(&l).await },
            |c: &usize| *c == n,
        )
        .await
    }

    /// More than `n` elements match
    pub async fn to_have_count_greater_than(&self, n: usize) -> SuiteResult<()> {
        self.check(
            &format!("to have count greater than {n}"),
            |d, l| async move { d.count(&l).await },
            |c: &usize| *c > n,
        )
        .await
    }

    /// The class attribute matches the regex `pattern`
    pub async fn to_have_class(&self, pattern: &str) -> SuiteResult<()> {
        let re = regex::Regex::new(pattern)
            .map_err(|e| SuiteError::config(format!("invalid class pattern {pattern:?}: {e}")))?;
        self.check(
            &format!("to have class /{pattern}/"),
            |d, l| async move { d.class_name(&l).await },
            |v: &String| re.is_match(v),
        )
        .await
    }
}

/// Expectations on the page itself
#[derive(Clone, Copy)]
pub struct PageExpect<'a> {
    driver: &'a dyn PageDriver,
    options: WaitOptions,
}

impl Debug for PageExpect<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageExpect")
            .field("driver", &self.driver.name())
            .field("options", &self.options)
            .finish()
    }
}

/// Start a page-level expectation bounded by 10s
#[must_use]
pub fn expect_page(driver: &dyn PageDriver) -> PageExpect<'_> {
    PageExpect {
        driver,
        options: WaitOptions::new(),
    }
}

impl PageExpect<'_> {
    /// Override the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options = WaitOptions::within(timeout);
        self
    }

    /// The URL matches `pattern` (literal via `Exact`, or `Regex`)
    pub async fn to_have_url(&self, pattern: &UrlPattern) -> SuiteResult<()> {
        let driver = self.driver;
        retry(
            self.options,
            "page",
            &format!("to have URL {pattern}"),
            || driver.current_url(),
            |url: &String| pattern.matches(url),
        )
        .await
    }

    /// The title matches the regex `pattern`
    pub async fn to_have_title(&self, pattern: &str) -> SuiteResult<()> {
        let re = regex::Regex::new(pattern)
            .map_err(|e| SuiteError::config(format!("invalid title pattern {pattern:?}: {e}")))?;
        let driver = self.driver;
        retry(
            self.options,
            "page",
            &format!("to have title /{pattern}/"),
            || driver.title(),
            |title: &String| re.is_match(title),
        )
        .await
    }
}

/// PrimeNG toast flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    /// Green success toast
    Success,
    /// Red error toast
    Error,
}

impl ToastKind {
    /// Container selector of this toast kind
    #[must_use]
    pub const fn css(&self) -> &'static str {
        match self {
            Self::Success => "div.p-toast-message-success",
            Self::Error => "div.p-toast-message-error",
        }
    }

    /// Locator of the toast container
    #[must_use]
    pub fn container(&self) -> Locator {
        Locator::css(self.css())
    }

    /// Locator of the toast's summary line
    #[must_use]
    pub fn summary(&self) -> Locator {
        Locator::css(format!("{} .p-toast-summary", self.css()))
    }

    /// Locator of the toast's detail line
    #[must_use]
    pub fn detail(&self) -> Locator {
        Locator::css(format!("{} .p-toast-detail", self.css()))
    }
}

/// The toast of `kind` is visible with exactly `summary` and `detail`
pub async fn assert_toast(
    driver: &dyn PageDriver,
    kind: ToastKind,
    summary: &str,
    detail: &str,
) -> SuiteResult<()> {
    expect(driver, &kind.container()).to_be_visible().await?;
    expect(driver, &kind.summary()).to_have_text(summary).await?;
    expect(driver, &kind.detail()).to_have_text(detail).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement};

    fn driver() -> MockDriver {
        let driver = MockDriver::new();
        driver.with_state(|s| {
            s.url = "http://localhost:4200/welcome".to_string();
            s.title = "CertGem - Portal".to_string();
            s.insert(MockElement::css("gem", "#gemName").with_value("Esmeralda Teste"));
            s.insert(MockElement::css("save", "button.save").disabled());
            s.insert(MockElement::css("pw", "#password").with_class("p-inputtext ng-invalid error"));
            s.insert(MockElement::css("c1", "div.gemologo-card").with_text("  Rubi\n Premium "));
            s.insert(MockElement::css("c2", "div.gemologo-card").hidden());
        });
        driver
    }

    mod locator_expect_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_value_and_text() {
            let d = driver();
            expect(&d, &Locator::css("#gemName"))
                .to_have_value("Esmeralda Teste")
                .await
                .unwrap();
            expect(&d, &Locator::css("div.gemologo-card"))
                .to_have_text("Rubi Premium")
                .await
                .unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_value_mismatch_reports_last_observed() {
            let d = driver();
            let err = expect(&d, &Locator::css("#gemName"))
                .with_timeout(Duration::from_millis(100))
                .to_have_value("Rubi")
                .await
                .unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains("to have value \"Rubi\""));
            assert!(msg.contains("\"Esmeralda Teste\""));
        }

        #[tokio::test(start_paused = true)]
        async fn test_visibility_and_count() {
            let d = driver();
            let cards = Locator::css("div.gemologo-card");
            expect(&d, &cards).to_have_count(2).await.unwrap();
            expect(&d, &cards).to_have_count_greater_than(0).await.unwrap();
            expect(&d, &cards.clone().first()).to_be_visible().await.unwrap();
            expect(&d, &cards.nth(1)).to_be_hidden().await.unwrap();
            expect(&d, &Locator::css("#missing")).to_be_hidden().await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_disabled_and_class() {
            let d = driver();
            expect(&d, &Locator::css("button.save")).to_be_disabled().await.unwrap();
            expect(&d, &Locator::css("#password")).to_have_class("error").await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_missing_element_times_out_as_assertion() {
            let d = driver();
            let err = expect(&d, &Locator::css("#missing").with_timeout(Duration::from_millis(50)))
                .to_be_enabled()
                .await
                .unwrap_err();
            assert!(matches!(err, SuiteError::AssertionFailed { .. }));
            assert!(err.to_string().contains("No element matches #missing"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_waits_for_late_element() {
            let d = driver();
            d.with_state(|s| {
                s.after(Duration::from_secs(2), |s| {
                    s.insert(MockElement::css("toast", "div.p-toast-message-success"));
                });
            });
            expect(&d, &ToastKind::Success.container())
                .to_be_visible()
                .await
                .unwrap();
        }
    }

    mod page_expect_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_url_literal_and_regex() {
            let d = driver();
            expect_page(&d)
                .to_have_url(&UrlPattern::Exact("http://localhost:4200/welcome".to_string()))
                .await
                .unwrap();
            expect_page(&d)
                .to_have_url(&UrlPattern::Regex(r"/welcome(\?.*)?$".to_string()))
                .await
                .unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_title_regex() {
            let d = driver();
            expect_page(&d).to_have_title("CertGem").await.unwrap();
            let err = expect_page(&d)
                .with_timeout(Duration::from_millis(10))
                .to_have_title("^Login$")
                .await
                .unwrap_err();
            assert!(matches!(err, SuiteError::AssertionFailed { .. }));
        }
    }

    mod toast_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_assert_toast() {
            let d = MockDriver::new();
            d.with_state(|s| {
                s.insert(MockElement::css("t", "div.p-toast-message-error"));
                s.insert(
                    MockElement::css("ts", "div.p-toast-message-error .p-toast-summary")
                        .with_text("Erro"),
                );
                s.insert(
                    MockElement::css("td", "div.p-toast-message-error .p-toast-detail")
                        .with_text("Erro ao carregar a lista de gemólogos."),
                );
            });
            assert_toast(
                &d,
                ToastKind::Error,
                "Erro",
                "Erro ao carregar a lista de gemólogos.",
            )
            .await
            .unwrap();
        }

        #[test]
        fn test_normalize_whitespace() {
            assert_eq!(normalize_whitespace("  a\n  b\tc "), "a b c");
        }
    }
}
