//! Store-specific errors (spec §4.1 "Error conditions").

use oec_protocol::{ErrorCode, SessionId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// The durable store is unwritable or unreadable. Fatal to the current
    /// operation; the caller (orchestrator) must surface this to the client.
    #[error("durable backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A durable record exists but failed to decode. Reported, never
    /// silently dropped (spec §4.1).
    #[error("corrupt record for session {session_id}: {detail}")]
    CorruptRecord {
        session_id: SessionId,
        detail: String,
    },
}

impl StoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::NotFound(_) => ErrorCode::UnknownSession,
            StoreError::BackendUnavailable(_) => ErrorCode::BackendUnavailable,
            StoreError::CorruptRecord { .. } => ErrorCode::CorruptRecord,
        }
    }
}
