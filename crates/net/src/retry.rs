//! Bounded retry with exponential backoff
//!
//! Only failures classified as transient consume retry budget; permanent
//! failures are returned on the first attempt.

use relbuild_errors::Error;
use std::future::Future;
use std::time::Duration;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }
}

/// Whether an error may succeed on retry
#[must_use]
pub fn is_transient(error: &Error) -> bool {
    match error {
        Error::Index(e) => e.is_transient(),
        Error::Io { .. } => true,
        _ => false,
    }
}

/// Calculate exponential backoff delay with jitter
#[must_use]
pub fn calculate_backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    // Precision loss acceptable for backoff calculations
    #[allow(clippy::cast_precision_loss)]
    let base_delay = config.initial_delay.as_millis().min(u128::from(u64::MAX)) as f64;
    #[allow(clippy::cast_precision_loss)]
    let max_delay = config.max_delay.as_millis().min(u128::from(u64::MAX)) as f64;

    // Retry attempts are small, so this cast is safe
    #[allow(clippy::cast_possible_wrap)]
    let exponent = attempt.saturating_sub(1) as i32;
    let delay = (base_delay * config.backoff_multiplier.powi(exponent)).min(max_delay);

    let jitter = delay * config.jitter_factor * (rand::random::<f64>() - 0.5);
    // max(0.0) keeps the value non-negative
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let final_delay = (delay + jitter).max(0.0).round() as u64;

    Duration::from_millis(final_delay)
}

/// Run `op` until it succeeds, fails permanently, or exhausts the budget
///
/// `on_retry` is called with the failed attempt number and its error before
/// each backoff sleep. On exhaustion the last error is returned together
/// with the number of attempts made.
///
/// # Errors
///
/// Returns the first permanent error, or the last transient one.
pub async fn retry_transient<T, F, Fut, R>(
    config: &RetryConfig,
    mut op: F,
    mut on_retry: R,
) -> Result<T, (Error, u32)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
    R: FnMut(u32, &Error),
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && is_transient(&err) => {
                on_retry(attempt, &err);
                tokio::time::sleep(calculate_backoff_delay(config, attempt)).await;
                attempt += 1;
            }
            Err(err) => return Err((err, attempt)),
        }
    }
}
