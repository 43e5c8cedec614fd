use oec_protocol::{ErrorCode, ErrorDetail};

/// Classification an [`crate::client::LlmClient`] implementation must assign to every
/// failure it returns, so [`crate::retry::call_llm`] knows whether (and how) to retry
/// it (spec §4.5, "Retry policy").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Provider reported 429 / rate-limit exhaustion. Retried with exponential backoff.
    RateLimited,
    /// Any other retriable failure: connection reset, 5xx, response timeout.
    /// Retried with linear backoff.
    Transient,
    /// Bad API key, disabled account, unreachable base URL misconfiguration. Never retried.
    Configuration,
    /// The pinned model name is not served by this provider. Never retried.
    UnsupportedModel,
    /// The request itself was malformed (e.g. prompt exceeds context window). Never retried.
    MalformedInput,
}

impl LlmErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmErrorKind::RateLimited | LlmErrorKind::Transient)
    }
}

/// A single failed attempt at calling the underlying provider.
#[derive(Debug, Clone)]
pub struct LlmCallError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmCallError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::RateLimited, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Transient, message)
    }
}

impl std::fmt::Display for LlmCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for LlmCallError {}

/// Terminal failure surfaced by [`crate::retry::call_llm`] once its retry budget is
/// exhausted, or immediately for a non-retryable [`LlmCallError`]. Carries the last
/// attempt's message verbatim (spec §7: "never truncated").
#[derive(Debug, Clone)]
pub struct LlmCallFailed {
    pub attempts: u32,
    pub last_error: LlmCallError,
}

impl std::fmt::Display for LlmCallFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "llm call failed after {} attempt(s): {}",
            self.attempts, self.last_error
        )
    }
}

impl std::error::Error for LlmCallFailed {}

impl From<LlmCallFailed> for ErrorDetail {
    fn from(failure: LlmCallFailed) -> Self {
        let code = match failure.last_error.kind {
            LlmErrorKind::RateLimited | LlmErrorKind::Transient => ErrorCode::LlmCallFailed,
            LlmErrorKind::Configuration | LlmErrorKind::UnsupportedModel | LlmErrorKind::MalformedInput => {
                ErrorCode::LlmCallFailed
            }
        };
        ErrorDetail::new(code, failure.to_string())
    }
}
