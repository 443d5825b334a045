//! Retry decorator with configurable backoff and jitter strategies.
//!
//! Retrying is not part of the engine. [`RetryStage`] wraps another stage and
//! re-runs it in isolation until it succeeds, then continues the chain once.
//! Failures raised further down the chain are never retried.

use super::Stage;
use crate::errors::StageError;
use crate::pipeline::{Next, Outcome};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff strategy for retry delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// delay = base * 2^retry
    #[default]
    Exponential,
    /// delay = base * (retry + 1)
    Linear,
    /// delay = base
    Constant,
}

/// Jitter strategy to prevent thundering herd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// No jitter
    None,
    /// Random from 0 to delay
    #[default]
    Full,
    /// Half fixed, half random
    Equal,
    /// min(max, random(base, prev * 3))
    Decorrelated,
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts, including the first one.
    pub max_attempts: usize,
    /// Base delay between attempts in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds.
    pub max_delay_ms: u64,
    /// Backoff strategy.
    pub backoff_strategy: BackoffStrategy,
    /// Jitter strategy.
    pub jitter_strategy: JitterStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 5_000,
            backoff_strategy: BackoffStrategy::Exponential,
            jitter_strategy: JitterStrategy::Full,
        }
    }
}

impl RetryConfig {
    /// Creates a new retry config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub const fn with_base_delay_ms(mut self, delay: u64) -> Self {
        self.base_delay_ms = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub const fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Sets the backoff strategy.
    #[must_use]
    pub const fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff_strategy = strategy;
        self
    }

    /// Sets the jitter strategy.
    #[must_use]
    pub const fn with_jitter(mut self, strategy: JitterStrategy) -> Self {
        self.jitter_strategy = strategy;
        self
    }

    /// Delay before the retry following failed attempt number `retry`
    /// (zero-based), before jitter.
    fn backoff_ms(&self, retry: u32) -> u64 {
        let base = self.base_delay_ms;
        let delay = match self.backoff_strategy {
            BackoffStrategy::Exponential => base.saturating_mul(2u64.saturating_pow(retry)),
            BackoffStrategy::Linear => base.saturating_mul(u64::from(retry) + 1),
            BackoffStrategy::Constant => base,
        };
        delay.min(self.max_delay_ms)
    }
}

/// Delay bookkeeping for one `handle` call.
#[derive(Debug, Default)]
struct Backoff {
    retry: u32,
    previous_ms: Option<u64>,
}

impl Backoff {
    fn next_delay(&mut self, config: &RetryConfig) -> Duration {
        let delay = config.backoff_ms(self.retry);
        let mut rng = rand::thread_rng();

        let jittered = match config.jitter_strategy {
            JitterStrategy::None => delay,
            JitterStrategy::Full => rng.gen_range(0..=delay),
            JitterStrategy::Equal => {
                let half = delay / 2;
                half + rng.gen_range(0..=delay - half)
            }
            JitterStrategy::Decorrelated => {
                let base = config.base_delay_ms;
                let prev = self.previous_ms.unwrap_or(base);
                let upper = prev.saturating_mul(3).min(config.max_delay_ms);
                if upper <= base {
                    base.min(config.max_delay_ms)
                } else {
                    rng.gen_range(base..=upper)
                }
            }
        };

        self.retry = self.retry.saturating_add(1);
        self.previous_ms = Some(jittered);
        Duration::from_millis(jittered)
    }
}

type RetryPredicate<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// Re-runs a wrapped stage when it fails.
///
/// Each attempt runs the wrapped stage on a clone of the payload with a
/// continuation that ends right away. When an attempt forwards, the outer
/// chain is continued exactly once with its result; when it short-circuits,
/// its value is returned. The calling thread sleeps between attempts.
pub struct RetryStage<S, E = StageError> {
    inner: S,
    config: RetryConfig,
    retry_if: Option<RetryPredicate<E>>,
}

impl<S, E> RetryStage<S, E> {
    /// Wraps `inner`, retrying on every error.
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self {
            inner,
            config,
            retry_if: None,
        }
    }

    /// Only retries errors for which `predicate` returns true.
    #[must_use]
    pub fn retry_if(mut self, predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        self.retry_if = Some(Box::new(predicate));
        self
    }

    /// Returns the retry configuration.
    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    fn should_retry(&self, error: &E) -> bool {
        self.retry_if.as_ref().map_or(true, |predicate| predicate(error))
    }
}

impl<S> RetryStage<S, StageError> {
    /// Wraps `inner`, retrying only failures marked retryable.
    pub fn transient(inner: S, config: RetryConfig) -> Self {
        Self::new(inner, config).retry_if(StageError::is_retryable)
    }
}

impl<S, E> Debug for RetryStage<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryStage")
            .field("config", &self.config)
            .field("has_predicate", &self.retry_if.is_some())
            .finish_non_exhaustive()
    }
}

impl<P, E, S> Stage<P, E> for RetryStage<S, E>
where
    P: Clone,
    E: Display,
    S: Stage<P, E>,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn handle(&self, payload: P, next: Next<'_, P, E>) -> Result<P, E> {
        let mut backoff = Backoff::default();
        let mut attempt = 1;

        loop {
            match next.run_detached(&self.inner, payload.clone()) {
                Ok(Outcome::Completed(value)) => return next.run(value),
                Ok(Outcome::ShortCircuited(value)) => return Ok(value),
                Err(e) if !self.should_retry(&e) => return Err(e),
                Err(e) if attempt >= self.config.max_attempts => {
                    warn!(
                        stage = self.inner.name(),
                        attempts = attempt,
                        error = %e,
                        "Retries exhausted"
                    );
                    return Err(e);
                }
                Err(e) => {
                    let delay = backoff.next_delay(&self.config);
                    debug!(
                        stage = self.inner.name(),
                        attempt = attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Retrying after error"
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::stages::FnStage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast() -> RetryConfig {
        RetryConfig::new()
            .with_base_delay_ms(0)
            .with_jitter(JitterStrategy::None)
    }

    /// Fails the first `failures` calls, then appends its tag and forwards.
    struct Flaky {
        failures: usize,
        calls: Arc<AtomicUsize>,
        retryable: bool,
    }

    impl Stage<Vec<String>> for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn handle(
            &self,
            mut payload: Vec<String>,
            next: Next<'_, Vec<String>>,
        ) -> Result<Vec<String>, StageError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            payload.push(format!("attempt-{call}"));
            if call < self.failures {
                return Err(if self.retryable {
                    StageError::retryable("flaky", "try again")
                } else {
                    StageError::failed("flaky", "broken")
                });
            }
            next.run(payload)
        }
    }

    fn flaky(failures: usize, retryable: bool) -> (Flaky, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let stage = Flaky {
            failures,
            calls: Arc::clone(&calls),
            retryable,
        };
        (stage, calls)
    }

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.backoff_strategy, BackoffStrategy::Exponential);
        assert_eq!(config.jitter_strategy, JitterStrategy::Full);
    }

    #[test]
    fn test_retry_config_from_json_fills_defaults() {
        let config: RetryConfig =
            serde_json::from_str(r#"{"max_attempts": 5, "backoff_strategy": "linear"}"#).unwrap();

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.backoff_strategy, BackoffStrategy::Linear);
        assert_eq!(config.base_delay_ms, 100);
    }

    #[test]
    fn test_backoff_exponential_capped() {
        let config = RetryConfig::new()
            .with_base_delay_ms(100)
            .with_max_delay_ms(500)
            .with_jitter(JitterStrategy::None);

        assert_eq!(config.backoff_ms(0), 100);
        assert_eq!(config.backoff_ms(1), 200);
        assert_eq!(config.backoff_ms(2), 400);
        assert_eq!(config.backoff_ms(3), 500);
    }

    #[test]
    fn test_backoff_linear_and_constant() {
        let linear = RetryConfig::new().with_base_delay_ms(100).with_backoff(BackoffStrategy::Linear);
        assert_eq!(linear.backoff_ms(0), 100);
        assert_eq!(linear.backoff_ms(2), 300);

        let constant = linear.with_backoff(BackoffStrategy::Constant);
        assert_eq!(constant.backoff_ms(7), 100);
    }

    #[test]
    fn test_jitter_bounds() {
        let config = RetryConfig::new()
            .with_base_delay_ms(100)
            .with_backoff(BackoffStrategy::Constant);

        for jitter in [JitterStrategy::Full, JitterStrategy::Equal] {
            let config = config.clone().with_jitter(jitter);
            for _ in 0..20 {
                let delay = Backoff::default().next_delay(&config);
                assert!(delay <= Duration::from_millis(100));
            }
        }

        let decorrelated = config.with_jitter(JitterStrategy::Decorrelated);
        let mut backoff = Backoff::default();
        for _ in 0..20 {
            let delay = backoff.next_delay(&decorrelated);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(5_000));
        }
    }

    #[test]
    fn test_retry_until_success_forwards_once() {
        let (stage, calls) = flaky(2, true);
        let downstream = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&downstream);

        let pipeline = Pipeline::<Vec<String>>::new()
            .pipe(RetryStage::new(stage, fast()))
            .pipe_map("after", move |mut v| {
                seen.fetch_add(1, Ordering::SeqCst);
                v.push("after".to_string());
                Ok(v)
            });

        let result = pipeline.process(Vec::new()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(downstream.load(Ordering::SeqCst), 1);
        // Failed attempts worked on clones, so only the last one is visible.
        assert_eq!(result, vec!["attempt-2", "after"]);
    }

    #[test]
    fn test_retry_exhausted_returns_last_error() {
        let (stage, calls) = flaky(10, true);
        let pipeline = Pipeline::<Vec<String>>::new()
            .pipe(RetryStage::new(stage, fast().with_max_attempts(3)));

        let err = pipeline.process(Vec::new()).unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_transient_skips_permanent_errors() {
        let (stage, calls) = flaky(1, false);
        let pipeline = Pipeline::<Vec<String>>::new().pipe(RetryStage::transient(stage, fast()));

        assert!(pipeline.process(Vec::new()).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_downstream_failures_are_not_retried() {
        let (stage, calls) = flaky(0, true);
        let pipeline = Pipeline::<Vec<String>>::new()
            .pipe(RetryStage::new(stage, fast()))
            .pipe_map("after", |_| Err(StageError::retryable("after", "down")));

        let err = pipeline.process(Vec::new()).unwrap_err();

        assert_eq!(err.stage(), Some("after"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retry_keeps_short_circuit() {
        let pipeline = Pipeline::<u8>::new()
            .pipe(RetryStage::new(
                FnStage::new("stop", |n: u8, _next: Next<'_, u8>| Ok(n + 1)),
                fast(),
            ))
            .pipe_map("after", |_| Ok(0));

        assert_eq!(pipeline.run(1).unwrap(), Outcome::ShortCircuited(2));
    }

    #[test]
    fn test_retry_stage_uses_inner_name() {
        let (stage, _) = flaky(0, true);
        let retry = RetryStage::new(stage, fast());
        assert_eq!(Stage::<Vec<String>>::name(&retry), "flaky");
    }
}
