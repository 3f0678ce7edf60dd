//! Backoff for idempotent upstream calls.
//!
//! Fee queries, gas estimates, receipt polls, membership reads, pins and
//! gateway fetches can all be repeated safely. A ledger write cannot, and
//! never goes through here.
//!
//! Only failures where no response arrived are retried. A request that
//! could not even be built fails on the first attempt, and any HTTP status
//! is handed back to the caller to interpret.

use std::future::Future;
use std::time::Duration;

/// Retry schedule: `retries` extra attempts, sleeping `base`, `2 * base`,
/// `4 * base`, ... between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Backoff {
    retries: u32,
    base: Duration,
}

impl Backoff {
    /// 200 ms, 400 ms, 800 ms, then a final attempt.
    pub(crate) const IDEMPOTENT: Self = Self {
        retries: 3,
        base: Duration::from_millis(200),
    };

    /// Sleep before retry number `attempt` (zero-based).
    pub(crate) fn delay(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `call` until it yields a response, a non-retryable error, or the
    /// schedule runs out. `call` must build a fresh request every time.
    pub(crate) async fn send<F, Fut>(&self, label: &str, call: F) -> Result<reqwest::Response, reqwest::Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempt = 0;
        loop {
            let err = match call().await {
                Ok(resp) => return Ok(resp),
                Err(e) => e,
            };
            if attempt == self.retries || !is_transport_failure(&err) {
                return Err(err);
            }
            let delay = self.delay(attempt);
            attempt += 1;
            tracing::warn!(
                call = label,
                attempt,
                retries = self.retries,
                "{label} got no response, retrying in {delay:?}: {err}"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// The request went out (or tried to) and nothing usable came back.
fn is_transport_failure(err: &reqwest::Error) -> bool {
    !(err.is_builder() || err.is_redirect() || err.is_status())
}

/// [`Backoff::IDEMPOTENT`] applied to one call.
pub(crate) async fn retry_send<F, Fut>(label: &str, call: F) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    Backoff::IDEMPOTENT.send(label, call).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> Backoff {
        Backoff {
            retries: 2,
            base: Duration::from_millis(1),
        }
    }

    #[test]
    fn idempotent_schedule_doubles_from_200ms() {
        let delays: Vec<_> = (0..3).map(|a| Backoff::IDEMPOTENT.delay(a)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800)
            ]
        );
    }

    #[test]
    fn huge_attempt_numbers_saturate() {
        assert_eq!(Backoff::IDEMPOTENT.delay(64), Backoff::IDEMPOTENT.delay(32));
    }

    #[tokio::test]
    async fn unreachable_host_uses_every_attempt() {
        let calls = AtomicU32::new(0);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        let result = fast()
            .send("closed_port", || {
                calls.fetch_add(1, Ordering::SeqCst);
                http.get("http://127.0.0.1:1/").send()
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn unbuildable_request_is_not_retried() {
        let calls = AtomicU32::new(0);
        let http = reqwest::Client::new();

        let err = fast()
            .send("relative_url", || {
                calls.fetch_add(1, Ordering::SeqCst);
                http.get("not a url").send()
            })
            .await
            .unwrap_err();

        assert!(err.is_builder());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
