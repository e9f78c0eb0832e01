//! Retry policy for calls to external collaborators.
//!
//! Every failure is classified into an [`ErrorClass`]. Retryable failures are
//! retried with exponential backoff up to a bounded number of attempts; fatal
//! and skip-unit failures are returned to the caller immediately so it can
//! abort the run or move on to the next unit of work.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::defaults;
use crate::error::Result;
use crate::logging;

/// How a failed call should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Temporary condition; the same call may succeed later.
    Retryable,
    /// This unit of work cannot succeed; skip it and continue.
    SkipUnit,
    /// Continuing would waste quota or cannot work; abort the run.
    Fatal,
}

/// What to do once a retryable failure has exhausted its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransientPolicy {
    /// Log and move on to the next unit.
    #[default]
    Continue,
    /// Stop the run.
    Abort,
}

impl std::str::FromStr for TransientPolicy {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "abort" => Ok(Self::Abort),
            _ => Err(format!("Invalid transient policy: {}", s)),
        }
    }
}

impl TransientPolicy {
    /// Read `TRANSIENT_POLICY` (`continue` | `abort`), defaulting to continue.
    pub fn from_env() -> Self {
        std::env::var("TRANSIENT_POLICY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

/// Bounded exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one (minimum 1).
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(defaults::RETRY_INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(defaults::RETRY_MAX_BACKOFF_MS),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `RETRY_MAX_ATTEMPTS` | `4` | Attempts per call, including the first |
    /// | `RETRY_INITIAL_BACKOFF_MS` | `2000` | First backoff delay |
    /// | `RETRY_MAX_BACKOFF_MS` | `30000` | Cap for any backoff delay |
    pub fn from_env() -> Self {
        let base = Self::default();
        let max_attempts = std::env::var("RETRY_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(base.max_attempts)
            .max(1);
        let initial_backoff = std::env::var("RETRY_INITIAL_BACKOFF_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(base.initial_backoff);
        let max_backoff = std::env::var("RETRY_MAX_BACKOFF_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(base.max_backoff);

        Self {
            max_attempts,
            initial_backoff,
            max_backoff,
            ..base
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set the number of attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the first backoff delay.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_backoff.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Run `call` until it succeeds, fails non-retryably, or attempts run out.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.class() == ErrorClass::Retryable && attempt < max_attempts => {
                    let delay = self.backoff_for(attempt);
                    warn!(
                        { logging::OPERATION } = operation,
                        { logging::ATTEMPT } = attempt,
                        { logging::ERROR_MSG } = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Retryable failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    debug!(
                        { logging::OPERATION } = operation,
                        { logging::ATTEMPT } = attempt,
                        class = ?e.class(),
                        "Giving up on call"
                    );
                    return Err(e);
                }
            }
        }
    }
}
