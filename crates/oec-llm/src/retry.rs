//! Bounded-retry `call_llm` wrapper (spec §4.5 "Retry policy").
//!
//! Classification happens in the [`crate::client::LlmClient`] implementation;
//! this module owns only the backoff schedule and attempt counting, kept
//! separate so the schedule itself is unit-testable without any network I/O
//! (see the fake client in this module's tests).

use std::time::Duration;

use tracing::warn;

use crate::client::{Completion, LlmClient};
use crate::errors::{LlmCallError, LlmCallFailed, LlmErrorKind};

/// `call_llm(prompt, system_message)` (spec §4.5): retries a retryable
/// failure up to `max_retries` total attempts, sleeping between attempts
/// according to the fault's classification —
///
/// - [`LlmErrorKind::RateLimited`]: exponential backoff, `2^attempt` seconds.
/// - [`LlmErrorKind::Transient`]: linear backoff, `1 + attempt` seconds.
/// - Anything else: surfaced immediately, no retry.
///
/// `attempt` is zero-based in the formulas above (the first retry sleeps
/// `2^0 = 1s` or `1 + 0 = 1s`). The sleep is the wrapper's only suspension
/// point and is therefore where an external cancellation deadline (the
/// caller's own `tokio::time::timeout`) takes effect — a caller that wraps
/// this call in a deadline simply has the whole future, sleep included,
/// dropped at expiry; nothing here needs tokio::select! for that.
pub async fn call_llm(
    client: &dyn LlmClient,
    prompt: &str,
    system_message: Option<&str>,
    max_retries: u32,
) -> Result<Completion, LlmCallFailed> {
    let max_retries = max_retries.max(1);
    let mut last_error: Option<LlmCallError> = None;

    for attempt in 0..max_retries {
        match client.complete(prompt, system_message).await {
            Ok(completion) => return Ok(completion),
            Err(err) => {
                if !err.kind.is_retryable() {
                    return Err(LlmCallFailed {
                        attempts: attempt + 1,
                        last_error: err,
                    });
                }

                let is_last_attempt = attempt + 1 == max_retries;
                if is_last_attempt {
                    last_error = Some(err);
                    break;
                }

                let backoff = backoff_for(err.kind, attempt);
                warn!(
                    attempt = attempt + 1,
                    max_retries,
                    backoff_secs = backoff.as_secs(),
                    error = %err,
                    "call_llm retrying after transient failure"
                );
                last_error = Some(err);
                tokio::time::sleep(backoff).await;
            }
        }
    }

    Err(LlmCallFailed {
        attempts: max_retries,
        last_error: last_error.expect("loop always records an error before exhausting retries"),
    })
}

fn backoff_for(kind: LlmErrorKind, attempt: u32) -> Duration {
    match kind {
        LlmErrorKind::RateLimited => Duration::from_secs(2u64.saturating_pow(attempt)),
        _ => Duration::from_secs(1 + attempt as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct ScriptedClient {
        responses: Vec<Result<Completion, LlmCallError>>,
        calls: Arc<AtomicU32>,
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(
            &self,
            _prompt: &str,
            _system_message: Option<&str>,
        ) -> Result<Completion, LlmCallError> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            self.responses[idx].clone()
        }
    }

    #[tokio::test]
    async fn succeeds_after_two_rate_limit_faults() {
        let calls = Arc::new(AtomicU32::new(0));
        let client = ScriptedClient {
            responses: vec![
                Err(LlmCallError::rate_limited("slow down")),
                Err(LlmCallError::rate_limited("slow down")),
                Ok(Completion {
                    text: "ok".to_string(),
                }),
            ],
            calls: calls.clone(),
        };

        let started = std::time::Instant::now();
        let result = call_llm(&client, "hi", None, 5).await.unwrap();
        assert_eq!(result.text, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 2^0 + 2^1 = 3s of sleep, tolerate scheduler jitter.
        assert!(started.elapsed() >= Duration::from_millis(2900));
    }

    #[tokio::test]
    async fn exhausts_after_five_consecutive_faults() {
        let calls = Arc::new(AtomicU32::new(0));
        let client = ScriptedClient {
            responses: (0..5)
                .map(|_| Err(LlmCallError::transient("still down")))
                .collect(),
            calls: calls.clone(),
        };

        let err = call_llm(&client, "hi", None, 5).await.unwrap_err();
        assert_eq!(err.attempts, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn non_retryable_fault_surfaces_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let client = ScriptedClient {
            responses: vec![Err(LlmCallError::new(
                LlmErrorKind::Configuration,
                "bad api key",
            ))],
            calls: calls.clone(),
        };

        let err = call_llm(&client, "hi", None, 5).await.unwrap_err();
        assert_eq!(err.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
