//! The context-RPC client (spec §4.5 "Context RPC"): agents never write the
//! store directly, they call the orchestrator's internal endpoints.

use oec_protocol::{bearer_header, ContextPatch, ErrorCode, ErrorDetail, SessionContext, SessionId};
use tracing::instrument;

#[derive(Debug)]
pub enum ContextClientError {
    Transport(String),
    /// The orchestrator answered with a structured `{error, detail}` body.
    Remote(ErrorDetail),
    Decode(String),
}

impl std::fmt::Display for ContextClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextClientError::Transport(e) => write!(f, "transport error: {e}"),
            ContextClientError::Remote(e) => write!(f, "{e}"),
            ContextClientError::Decode(e) => write!(f, "decode error: {e}"),
        }
    }
}

impl std::error::Error for ContextClientError {}

/// Thin `reqwest` client bound to one orchestrator and one bearer token,
/// shared by every task handler an agent registers. Every call carries
/// `X-Agent-Name` so the orchestrator can attribute a patch to this agent
/// without trusting the transport-level source address (spec §4.4's "agent
/// identity from source URL", adapted — see DESIGN.md).
pub struct ContextClient {
    http: reqwest::Client,
    orchestrator_base_url: String,
    bearer_token: String,
    agent_name: String,
}

impl ContextClient {
    pub fn new(
        orchestrator_base_url: impl Into<String>,
        bearer_token: impl Into<String>,
        agent_name: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            orchestrator_base_url: orchestrator_base_url.into(),
            bearer_token: bearer_token.into(),
            agent_name: agent_name.into(),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_context(&self, session_id: SessionId) -> Result<SessionContext, ContextClientError> {
        let url = format!(
            "{}/internal/sessions/{session_id}/context",
            self.orchestrator_base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .get(&url)
            .header("Authorization", bearer_header(&self.bearer_token))
            .header("X-Agent-Name", &self.agent_name)
            .send()
            .await
            .map_err(|e| ContextClientError::Transport(e.to_string()))?;

        decode_or_remote_error(response).await
    }

    /// Submit a field-scoped patch (spec §4.4: "Agents propose
    /// payload-scoped updates ... via the internal patch endpoint").
    #[instrument(skip(self, patch))]
    pub async fn patch_context(
        &self,
        session_id: SessionId,
        patch: &ContextPatch,
    ) -> Result<SessionContext, ContextClientError> {
        let url = format!(
            "{}/internal/sessions/{session_id}/context",
            self.orchestrator_base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .patch(&url)
            .header("Authorization", bearer_header(&self.bearer_token))
            .header("X-Agent-Name", &self.agent_name)
            .json(patch)
            .send()
            .await
            .map_err(|e| ContextClientError::Transport(e.to_string()))?;

        decode_or_remote_error(response).await
    }
}

async fn decode_or_remote_error(
    response: reqwest::Response,
) -> Result<SessionContext, ContextClientError> {
    if response.status().is_success() {
        response
            .json()
            .await
            .map_err(|e| ContextClientError::Decode(e.to_string()))
    } else {
        match response.json::<ErrorDetail>().await {
            Ok(detail) => Err(ContextClientError::Remote(detail)),
            Err(e) => Err(ContextClientError::Decode(e.to_string())),
        }
    }
}

/// Lets task handlers propagate a failed context-RPC call as the
/// [`ErrorDetail`] their `TaskHandler::handle` signature expects.
impl From<ContextClientError> for ErrorDetail {
    fn from(err: ContextClientError) -> Self {
        match err {
            ContextClientError::Remote(detail) => detail,
            ContextClientError::Transport(e) => ErrorDetail::new(ErrorCode::TransportError, e),
            ContextClientError::Decode(e) => ErrorDetail::new(ErrorCode::TransportError, e),
        }
    }
}
