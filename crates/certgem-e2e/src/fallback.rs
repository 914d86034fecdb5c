//! Ordered fallback chains.
//!
//! Some portal behaviours are not stable enough to assert directly: logout
//! lives behind either of two labels, and validation may surface as text, a
//! CSS class or a disabled button. A [`FallbackChain`] tries named strategies
//! in order, swallows each failure with a warning, and returns which one
//! succeeded. When every strategy fails the chain ends in an explicit
//! [`SuiteError::FallbackExhausted`].

use crate::result::{SuiteError, SuiteResult};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

type StrategyFuture<'a> = Pin<Box<dyn Future<Output = SuiteResult<()>> + 'a>>;
type StrategyFn<'a> = Box<dyn FnOnce() -> StrategyFuture<'a> + 'a>;

/// A failed strategy and why it failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// Strategy name
    pub strategy: String,
    /// Error message
    pub error: String,
}

/// Which strategy satisfied a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Chain name
    pub chain: String,
    /// Strategy that succeeded
    pub satisfied_by: String,
    /// Strategies that failed before it
    pub failed: Vec<Attempt>,
}

impl Outcome {
    /// Whether the first strategy succeeded
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.failed.is_empty()
    }

    /// Zero-based position of the winning strategy
    #[must_use]
    pub fn tier(&self) -> usize {
        self.failed.len()
    }
}

/// Ordered list of strategies tried until one succeeds
pub struct FallbackChain<'a> {
    name: String,
    strategies: Vec<(String, StrategyFn<'a>)>,
    exhausted_message: String,
}

impl fmt::Debug for FallbackChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackChain")
            .field("name", &self.name)
            .field(
                "strategies",
                &self.strategies.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field("exhausted_message", &self.exhausted_message)
            .finish()
    }
}

impl<'a> FallbackChain<'a> {
    /// Create an empty chain
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            exhausted_message: format!("no strategy satisfied {name}"),
            name,
            strategies: Vec::new(),
        }
    }

    /// Append a strategy
    #[must_use]
    pub fn then<F, Fut>(mut self, name: impl Into<String>, strategy: F) -> Self
    where
        F: FnOnce() -> Fut + 'a,
        Fut: Future<Output = SuiteResult<()>> + 'a,
    {
        let run: StrategyFn<'a> =
            Box::new(move || -> StrategyFuture<'a> { Box::pin(strategy()) });
        self.strategies.push((name.into(), run));
        self
    }

    /// Message carried by the error when every strategy fails
    #[must_use]
    pub fn or_fail(mut self, message: impl Into<String>) -> Self {
        self.exhausted_message = message.into();
        self
    }

    /// Strategy names in order
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Try each strategy in order until one succeeds
    pub async fn run(self) -> SuiteResult<Outcome> {
        let mut failed = Vec::new();
        for (strategy, run) in self.strategies {
            match run().await {
                Ok(()) => {
                    tracing::debug!(chain = %self.name, %strategy, tier = failed.len(), "fallback satisfied");
                    return Ok(Outcome {
                        chain: self.name,
                        satisfied_by: strategy,
                        failed,
                    });
                }
                Err(err) => {
                    tracing::warn!(chain = %self.name, %strategy, error = %err, "strategy failed, degrading");
                    failed.push(Attempt {
                        strategy,
                        error: err.to_string(),
                    });
                }
            }
        }
        Err(SuiteError::FallbackExhausted {
            chain: self.name,
            message: self.exhausted_message,
            attempts: failed.into_iter().map(|a| a.strategy).collect(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fail(msg: &str) -> SuiteResult<()> {
        Err(SuiteError::assertion(msg))
    }

    #[tokio::test]
    async fn test_first_strategy_wins() {
        let outcome = FallbackChain::new("logout")
            .then("primary", || async { Ok(()) })
            .then("secondary", || async { fail("unreachable") })
            .run()
            .await
            .unwrap();
        assert_eq!(outcome.satisfied_by, "primary");
        assert!(outcome.is_primary());
    }

    #[tokio::test]
    async fn test_degrades_in_order() {
        let outcome = FallbackChain::new("logout")
            .then("Logout", || async { fail("not visible") })
            .then("Sair", || async { fail("not visible") })
            .then("clear storage", || async { Ok(()) })
            .run()
            .await
            .unwrap();
        assert_eq!(outcome.satisfied_by, "clear storage");
        assert_eq!(outcome.tier(), 2);
        assert_eq!(outcome.failed[0].strategy, "Logout");
        assert!(outcome.failed[1].error.contains("not visible"));
    }

    #[tokio::test]
    async fn test_later_strategies_not_run_after_success() {
        let counter = Cell::new(0);
        let ran = &counter;
        let _ = FallbackChain::new("count")
            .then("a", move || async move {
                ran.set(ran.get() + 1);
                fail("no")
            })
            .then("b", move || async move {
                ran.set(ran.get() + 1);
                Ok(())
            })
            .then("c", move || async move {
                ran.set(ran.get() + 1);
                Ok(())
            })
            .run()
            .await
            .unwrap();
        assert_eq!(counter.get(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_is_explicit_error() {
        let err = FallbackChain::new("empty-fields validation")
            .then("button disabled", || async { fail("enabled") })
            .then("both messages", || async { fail("missing") })
            .or_fail("no required-field validation detected")
            .run()
            .await
            .unwrap_err();
        match err {
            SuiteError::FallbackExhausted {
                chain,
                message,
                attempts,
            } => {
                assert_eq!(chain, "empty-fields validation");
                assert_eq!(message, "no required-field validation detected");
                assert_eq!(attempts, vec!["button disabled", "both messages"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_chain_fails() {
        let chain = FallbackChain::new("nothing");
        assert!(chain.strategy_names().is_empty());
        assert!(chain.run().await.is_err());
    }
}
