//! The error taxonomy from spec §7, shared so every component (store, router,
//! LLM wrapper, orchestrator, agents) reports failures using the same vocabulary.
//!
//! [`ErrorCode`] is the wire-level tag carried in [`crate::envelope::MessagePayload::Error`]
//! and in REST error bodies (`{"error": <code>, "detail": ...}`); [`ErrorDetail`]
//! pairs it with a human-readable message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, machine-readable error codes. Serializes as the exact snake_case
/// token spec §7 names (`unsupported_format`, `llm_call_failed`, ...) so a
/// client or agent can match on it without string-munging a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors — 4xx, do not alter session stage.
    #[error("invalid_path")]
    InvalidPath,
    #[error("unsupported_format")]
    UnsupportedFormat,
    #[error("invalid_state")]
    InvalidState,
    #[error("unknown_session")]
    UnknownSession,
    #[error("unknown_task")]
    UnknownTask,

    // Transient downstream errors — bounded retry, or surfaced as a timeout.
    #[error("llm_rate_limited")]
    LlmRateLimited,
    #[error("llm_transient")]
    LlmTransient,
    #[error("transport_error")]
    TransportError,
    #[error("timeout_error")]
    TimeoutError,

    // Terminal domain errors — move the session to `failed`.
    #[error("conversion_failed")]
    ConversionFailed,
    #[error("validation_unreadable")]
    ValidationUnreadable,
    #[error("llm_call_failed")]
    LlmCallFailed,

    // Terminal infrastructure errors — 5xx, no stack traces leaked.
    #[error("backend_unavailable")]
    BackendUnavailable,
    #[error("invalid_patch")]
    InvalidPatch,
    #[error("agent_not_registered")]
    AgentNotRegistered,
    #[error("remote_error")]
    RemoteError,
    #[error("corrupt_record")]
    CorruptRecord,
}

impl ErrorCode {
    /// Whether this code represents an input error that should map to a 4xx
    /// response on the client REST surface without touching session state.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::InvalidPath
                | ErrorCode::UnsupportedFormat
                | ErrorCode::InvalidState
                | ErrorCode::UnknownSession
                | ErrorCode::UnknownTask
        )
    }

    /// Whether this code is terminal to the current workflow stage (moves the
    /// session to `failed` and requires user clarification, §7).
    pub fn is_terminal_domain_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::ConversionFailed
                | ErrorCode::ValidationUnreadable
                | ErrorCode::LlmCallFailed
        )
    }
}

/// A code plus a human-readable message, as carried on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorDetail {}
