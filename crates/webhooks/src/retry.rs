use std::future::Future;
use std::time::Duration;

use lightquote_core::config::RetryConfig;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::WebhookError;

/// How many times a webhook call is repeated after a retryable failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self { max_retries: config.max_retries, backoff: Duration::from_millis(config.backoff_ms) }
    }

    pub fn none() -> Self {
        Self { max_retries: 0, backoff: Duration::ZERO }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Exponential: `backoff`, then twice that, and so on.
    fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 1, backoff: Duration::from_millis(500) }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Delivery<T> {
    pub value: T,
    pub attempts: u32,
}

#[derive(Debug, Error)]
#[error("{error} (after {attempts} attempt(s))")]
pub struct DeliveryFailure {
    pub attempts: u32,
    #[source]
    pub error: WebhookError,
}

impl DeliveryFailure {
    pub fn before_sending(error: WebhookError) -> Self {
        Self { attempts: 0, error }
    }
}

/// Runs `call` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up.
pub async fn deliver<T, F, Fut>(
    policy: RetryPolicy,
    webhook: &'static str,
    mut call: F,
) -> Result<Delivery<T>, DeliveryFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, WebhookError>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        match call().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(
                        event_name = "webhook.recovered",
                        webhook,
                        attempts = attempt,
                        "webhook call succeeded after retry"
                    );
                }
                return Ok(Delivery { value, attempts: attempt });
            }
            Err(error) => {
                let retry = error.is_retryable() && attempt < max_attempts;
                warn!(
                    event_name = "webhook.attempt_failed",
                    webhook,
                    attempt,
                    max_attempts,
                    retry,
                    error_class = error.class(),
                    error = %error,
                    "webhook call failed"
                );
                if !retry {
                    return Err(DeliveryFailure { attempts: attempt, error });
                }

                let delay = policy.delay_after(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::{deliver, RetryPolicy};
    use crate::error::WebhookError;

    fn quick(max_retries: u32) -> RetryPolicy {
        RetryPolicy { max_retries, backoff: Duration::ZERO }
    }

    #[tokio::test]
    async fn retryable_failure_is_attempted_once_more() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let delivery = deliver(quick(1), "submission", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(WebhookError::Status { webhook: "submission", status: 502 })
            } else {
                Ok("accepted")
            }
        })
        .await
        .expect("second attempt should succeed");

        assert_eq!(delivery.value, "accepted");
        assert_eq!(delivery.attempts, 2);
    }

    #[tokio::test]
    async fn retries_stop_at_the_configured_bound() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let failure = deliver(quick(1), "submission", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(WebhookError::Status { webhook: "submission", status: 500 })
        })
        .await
        .expect_err("every attempt fails");

        assert_eq!(failure.attempts, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(failure.to_string().contains("after 2 attempt(s)"));
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let failure = deliver(quick(3), "extraction", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(WebhookError::Status { webhook: "extraction", status: 400 })
        })
        .await
        .expect_err("client errors are final");

        assert_eq!(failure.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy { max_retries: 3, backoff: Duration::from_millis(100) };

        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
    }
}
