use std::time::Duration;

use oec_protocol::{ErrorCode, ErrorDetail, MessageEnvelope, MessagePayload, SessionId, TaskStatus};
use oec_registry::AgentRegistry;
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::errors::RouterError;

/// Envelopes are delivered by POSTing the serialized [`MessageEnvelope`] to
/// this path on the target agent's `base_url` (spec §4.5, "Message intake").
const MESSAGE_PATH: &str = "/messages";

/// Default per-call timeout (spec §5: "default 60s, caller may override up
/// to a 300s ceiling").
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const MAX_TIMEOUT: Duration = Duration::from_secs(300);

/// Routes typed envelopes to registered agents over HTTP (spec §4.3).
///
/// The router performs exactly one delivery attempt per call — at-most-once
/// semantics, no automatic retry of a routed `agent_execute`. Retrying a
/// failed LLM call inside an agent's own handler is a different concern,
/// implemented by `oec-llm`.
pub struct MessageRouter {
    registry: Arc<AgentRegistry>,
    client: reqwest::Client,
}

impl MessageRouter {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self {
            registry,
            client: reqwest::Client::new(),
        }
    }

    /// Deliver `envelope` to `envelope.target_agent` and return the agent's
    /// response envelope. `timeout` is clamped to [`MAX_TIMEOUT`]; pass
    /// `None` for the [`DEFAULT_TIMEOUT`].
    #[instrument(skip(self, envelope), fields(target = %envelope.target_agent, message_type = envelope.payload.message_type()))]
    pub async fn send(
        &self,
        envelope: MessageEnvelope,
        timeout: Option<Duration>,
    ) -> Result<MessageEnvelope, RouterError> {
        let target = envelope.target_agent.clone();
        let record = self
            .registry
            .get(&target)
            .await
            .map_err(|_| RouterError::AgentNotRegistered(target.clone()))?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT).min(MAX_TIMEOUT);
        let url = format!("{}{MESSAGE_PATH}", record.base_url.trim_end_matches('/'));

        let started = std::time::Instant::now();
        let response = tokio::time::timeout(timeout, self.client.post(&url).json(&envelope).send())
            .await
            .map_err(|_| RouterError::Timeout {
                agent: target.clone(),
                elapsed_ms: started.elapsed().as_millis(),
            })?
            .map_err(|e| {
                warn!(agent = %target, error = %e, "transport error routing message");
                RouterError::Transport {
                    agent: target.clone(),
                    detail: e.to_string(),
                }
            })?;

        let response = response.error_for_status().map_err(|e| RouterError::Transport {
            agent: target.clone(),
            detail: e.to_string(),
        })?;

        let body: MessageEnvelope = response.json().await.map_err(|e| RouterError::MalformedResponse {
            agent: target.clone(),
            detail: e.to_string(),
        })?;

        match &body.payload {
            MessagePayload::Error { detail } => {
                return Err(RouterError::Remote {
                    agent: target,
                    detail: detail.clone(),
                });
            }
            // An agent answers agent_execute with AgentResponse; a Failed
            // status is itself a non-success envelope (spec §4.3: "agent
            // returned a non-success envelope") even though it travels
            // inside a 200 OK HTTP response, not a top-level Error payload.
            MessagePayload::AgentResponse {
                status: TaskStatus::Failed,
                error,
                ..
            } => {
                let detail = error.clone().unwrap_or_else(|| {
                    ErrorDetail::new(ErrorCode::RemoteError, "agent reported failure with no error detail")
                });
                return Err(RouterError::Remote { agent: target, detail });
            }
            _ => {}
        }

        Ok(body)
    }

    /// Convenience wrapper for the common case of dispatching an
    /// `agent_execute` task (spec §4.5.1, step 1).
    pub async fn execute(
        &self,
        source_agent: &str,
        target_agent: &str,
        session_id: SessionId,
        task: impl Into<String>,
        parameters: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<MessageEnvelope, RouterError> {
        let envelope = MessageEnvelope::new(
            source_agent,
            target_agent,
            Some(session_id),
            MessagePayload::AgentExecute {
                task: task.into(),
                parameters,
            },
        );
        self.send(envelope, timeout).await
    }
}
