use oec_protocol::ErrorCode;
use thiserror::Error;

/// Failures the Message Router can report back to a caller (spec §4.3).
/// Each variant maps onto one of the transport-layer [`ErrorCode`]s; a
/// `remote_error` means the agent itself answered with an `error` payload,
/// which this type carries through unmodified.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("agent not registered: {0}")]
    AgentNotRegistered(String),

    #[error("transport error reaching {agent}: {detail}")]
    Transport { agent: String, detail: String },

    #[error("timed out waiting for {agent} after {elapsed_ms}ms")]
    Timeout { agent: String, elapsed_ms: u128 },

    #[error("{agent} returned an error: {detail}")]
    Remote {
        agent: String,
        detail: oec_protocol::ErrorDetail,
    },

    /// The agent's HTTP response body did not decode as a [`oec_protocol::MessageEnvelope`].
    #[error("malformed response from {agent}: {detail}")]
    MalformedResponse { agent: String, detail: String },
}

impl RouterError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RouterError::AgentNotRegistered(_) => ErrorCode::AgentNotRegistered,
            RouterError::Transport { .. } => ErrorCode::TransportError,
            RouterError::Timeout { .. } => ErrorCode::TimeoutError,
            RouterError::Remote { detail, .. } => detail.code,
            RouterError::MalformedResponse { .. } => ErrorCode::RemoteError,
        }
    }
}
