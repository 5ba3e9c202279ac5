//! Transparent retry for the HTTP client capability.
//!
//! Mirrors a session-level retry adapter: GET requests that come back with
//! 429/500/502/503/504, or that fail to connect or time out, are retried with
//! exponential backoff before the caller ever sees them. Blocked statuses
//! (403/412) are not handled here; they reach the caller as responses so the
//! fetch loops can apply their own, much longer, backoff.

use std::future::Future;
use std::time::Duration;

use shelfscan_core::RetryPolicy;

use crate::error::{FailureKind, ScraperError};

/// Statuses the HTTP client retries on its own.
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Transient conditions: a [`RETRY_STATUSES`] status (surfaced as
/// [`ScraperError::RetriesExhausted`]) or a timeout/connection failure.
fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RetriesExhausted { .. } => true,
        ScraperError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        _ => false,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// On a retriable error the function sleeps for
/// `backoff_base_secs * 2^(n-1)` seconds before the n-th retry, up to
/// `max_retries` additional attempts after the first try. If all retries are
/// exhausted the last error is returned.
///
/// With the default base of 2 the retries wait 2 s, 4 s, then 8 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut last_err;
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                last_err = err;
            }
        }

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::debug!(
            attempt,
            max_retries,
            delay_secs,
            error = %last_err,
            "transient HTTP error, client retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}

/// Retry-pass delay after a failure of `kind` on 1-based `attempt`.
pub(crate) fn retry_pass_delay(policy: &RetryPolicy, kind: FailureKind, attempt: u32) -> Duration {
    match kind {
        FailureKind::Blocked => policy.blocked_delay(attempt),
        FailureKind::Transport | FailureKind::Status | FailureKind::Malformed => {
            policy.error_delay(attempt)
        }
    }
}

/// Second-pass retry for a listing page that already failed once.
///
/// Tries `operation` up to `policy.page_attempts` times (at least once),
/// sleeping [`retry_pass_delay`] between attempts. Returns the last error
/// when every attempt fails; there is no sleep after the final one.
pub(crate) async fn retry_pass<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let attempts = policy.page_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if attempt >= attempts {
            return Err(err);
        }

        let delay = retry_pass_delay(policy, err.kind(), attempt);
        tracing::warn!(
            attempt,
            delay_secs = delay.as_secs(),
            kind = ?err.kind(),
            error = %err,
            "retry attempt failed, backing off"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Detail-fetch retry: up to `policy.detail_attempts` tries (at least
/// once), sleeping `detail_delay(attempt)` with `attempt` counted from zero.
/// Returns the last error when every attempt fails.
pub(crate) async fn retry_detail<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let attempts = policy.detail_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if attempt + 1 >= attempts {
            return Err(err);
        }

        let delay = policy.detail_delay(attempt);
        tracing::debug!(
            attempt,
            delay_secs = delay.as_secs(),
            error = %err,
            "detail fetch failed, backing off"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn exhausted(status: u16) -> ScraperError {
        ScraperError::RetriesExhausted {
            url: "https://api.example.com/v3/product-search".to_owned(),
            status,
        }
    }

    /// Runs `retry_with_backoff` with zero delay over a scripted sequence of
    /// outcomes, returning the result and the number of calls made.
    async fn run_script(
        max_retries: u32,
        script: fn(u32) -> Result<u32, ScraperError>,
    ) -> (Result<u32, ScraperError>, u32) {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(max_retries, 0, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { script(n) }
        })
        .await;
        (result, calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let (result, calls) = run_script(3, |_| Ok(42)).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn retries_on_retry_status_then_succeeds() {
        let (result, calls) = run_script(3, |n| {
            if n < 2 {
                Err(exhausted(503))
            } else {
                Ok(99)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn propagates_last_error_after_exhausting_retries() {
        let (result, calls) = run_script(2, |_| Err(exhausted(429))).await;
        // max_retries=2 means 3 total attempts
        assert_eq!(calls, 3);
        assert!(matches!(
            result,
            Err(ScraperError::RetriesExhausted { status: 429, .. })
        ));
    }

    #[tokio::test]
    async fn does_not_retry_blocked() {
        let (result, calls) = run_script(3, |_| {
            Err(ScraperError::Blocked {
                url: "https://api.example.com".to_owned(),
                status: 403,
            })
        })
        .await;
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(ScraperError::Blocked { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_malformed() {
        let (result, calls) = run_script(3, |_| {
            Err(ScraperError::Malformed {
                context: "test".to_owned(),
                reason: "missing data".to_owned(),
            })
        })
        .await;
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(ScraperError::Malformed { .. })));
    }

    fn blocked() -> ScraperError {
        ScraperError::Blocked {
            url: "https://api.example.com".to_owned(),
            status: 403,
        }
    }

    fn malformed() -> ScraperError {
        ScraperError::Malformed {
            context: "listing page".to_owned(),
            reason: "missing data".to_owned(),
        }
    }

    /// Runs `retry` over scripted outcomes on a paused clock, returning the
    /// result, the call count, and the virtual time spent sleeping.
    async fn timed<R, Fut>(
        retry: R,
        script: fn(u32) -> Result<u32, ScraperError>,
    ) -> (Result<u32, ScraperError>, u32, Duration)
    where
        R: FnOnce(Box<dyn FnMut() -> std::future::Ready<Result<u32, ScraperError>>>) -> Fut,
        Fut: Future<Output = Result<u32, ScraperError>>,
    {
        let calls = std::sync::Arc::new(AtomicU32::new(0));
        let counter = std::sync::Arc::clone(&calls);
        let start = tokio::time::Instant::now();
        let result = retry(Box::new(move || {
            std::future::ready(script(counter.fetch_add(1, Ordering::SeqCst)))
        }))
        .await;
        (result, calls.load(Ordering::SeqCst), start.elapsed())
    }

    #[test]
    fn retry_pass_delay_depends_on_kind() {
        let policy = RetryPolicy::default();
        assert_eq!(
            retry_pass_delay(&policy, FailureKind::Blocked, 2),
            Duration::from_secs(120)
        );
        assert_eq!(
            retry_pass_delay(&policy, FailureKind::Malformed, 2),
            Duration::from_secs(20)
        );
        assert_eq!(
            retry_pass_delay(&policy, FailureKind::Transport, 1),
            Duration::from_secs(10)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retry_pass_waits_sixty_seconds_after_a_block() {
        let policy = RetryPolicy::default();
        let (result, calls, waited) = timed(
            |op| retry_pass(&policy, op),
            |n| if n == 0 { Err(blocked()) } else { Ok(7) },
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 2);
        assert_eq!(waited, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_pass_waits_ten_seconds_after_a_malformed_body() {
        let policy = RetryPolicy::default();
        let (result, calls, waited) = timed(
            |op| retry_pass(&policy, op),
            |n| if n == 0 { Err(malformed()) } else { Ok(7) },
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 2);
        assert_eq!(waited, Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_pass_gives_up_without_a_trailing_sleep() {
        let policy = RetryPolicy::default();
        let (result, calls, waited) =
            timed(|op| retry_pass(&policy, op), |_| Err(blocked())).await;
        assert!(matches!(result, Err(ScraperError::Blocked { .. })));
        assert_eq!(calls, 3);
        // 60s after attempt 1, 120s after attempt 2
        assert_eq!(waited, Duration::from_secs(180));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_detail_doubles_from_two_seconds() {
        let policy = RetryPolicy::default();
        let (result, calls, waited) = timed(
            |op| retry_detail(&policy, op),
            |n| if n < 2 { Err(blocked()) } else { Ok(7) },
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 3);
        assert_eq!(waited, Duration::from_secs(2 + 4));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_detail_returns_last_error_after_every_attempt() {
        let policy = RetryPolicy::default();
        let (result, calls, waited) =
            timed(|op| retry_detail(&policy, op), |_| Err(malformed())).await;
        assert!(matches!(result, Err(ScraperError::Malformed { .. })));
        assert_eq!(calls, 3);
        assert_eq!(waited, Duration::from_secs(2 + 4));
    }
}
