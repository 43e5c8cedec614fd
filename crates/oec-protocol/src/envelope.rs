//! The typed message envelope (spec §3.2).
//!
//! The source system modelled messages as a loose keyed bag with a
//! `message_type` string and an untyped `payload` dictionary; callers then
//! branched on string lookups inside the payload to decide what fields to
//! expect. [`MessagePayload`] replaces that with a closed tagged union —
//! one variant per wire `message_type` — so a handler matches on the tag and
//! the compiler guarantees every field it expects is actually there (spec
//! §9, "Dynamic, keyword-driven payloads").

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentType;
use crate::errors::ErrorDetail;
use crate::ids::{MessageId, SessionId};
use crate::session::{ConversionResults, DatasetInfo, NwbMetadata, ValidationResults};

/// Outcome reported by an agent for one `agent_execute` task (spec §4.5
/// "Message intake").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Success,
    Failed,
}

/// A field-scoped update an agent proposes for the session context (spec
/// §4.4: "Agents propose payload-scoped updates ... via the internal patch
/// endpoint; the orchestrator applies them atomically after validating
/// stage consistency"). Every field the orchestrator itself owns
/// (`workflow_stage`, `current_agent`, `agent_history`,
/// `requires_user_clarification`, `clarification_prompt`) is deliberately
/// absent — an agent requests their effect via [`ContextPatch::handoff`] or
/// [`ContextPatch::failure`] instead of setting them directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextPatch {
    pub dataset_info: Option<DatasetInfo>,
    pub metadata: Option<NwbMetadata>,
    pub conversion_results: Option<ConversionResults>,
    pub validation_results: Option<ValidationResults>,
    pub output_nwb_path: Option<String>,
    pub output_report_path: Option<String>,
    /// Present when the submitting agent wants the orchestrator to hand off
    /// to the next stage immediately after applying this patch.
    pub handoff: Option<HandoffRequest>,
    /// Present when the submitting agent's task failed and the session
    /// should move to `failed` with a clarification prompt.
    pub failure: Option<FailureReport>,
    /// Set by the Evaluation agent's terminal patch (spec §4.4: "Evaluation
    /// agent performs the terminal transition to `completed`"). There is no
    /// next agent to hand off to, so completion needs its own signal rather
    /// than reusing [`ContextPatch::handoff`].
    #[serde(default)]
    pub completes_workflow: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffRequest {
    pub target_agent: AgentType,
    pub task: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReport {
    /// Full technical error (message + trace), preserved verbatim in
    /// `agent_history` for diagnosis (spec §7: "never truncated").
    pub technical_message: String,
    pub technical_trace: Option<String>,
    /// Actionable, user-facing remediation text shown as the clarification
    /// prompt (spec §4.5.2 step 5: "≤200 words, actionable").
    pub user_message: String,
}

/// One payload variant per wire `message_type` tag (spec §3.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum MessagePayload {
    AgentRegister {
        agent_name: String,
        agent_type: AgentType,
        capabilities: Vec<String>,
        base_url: String,
    },
    AgentExecute {
        task: String,
        parameters: serde_json::Value,
    },
    AgentResponse {
        status: TaskStatus,
        result: Option<serde_json::Value>,
        error: Option<ErrorDetail>,
    },
    ContextUpdate {
        patch: ContextPatch,
    },
    Error {
        detail: ErrorDetail,
    },
    HealthCheck,
    HealthResponse {
        agent_name: String,
        agent_type: AgentType,
        status: String,
    },
}

impl MessagePayload {
    /// The wire tag for this variant, mirroring spec §3.2's closed set
    /// `{agent_register, agent_execute, agent_response, context_update,
    /// error, health_check, health_response}`.
    pub fn message_type(&self) -> &'static str {
        match self {
            MessagePayload::AgentRegister { .. } => "agent_register",
            MessagePayload::AgentExecute { .. } => "agent_execute",
            MessagePayload::AgentResponse { .. } => "agent_response",
            MessagePayload::ContextUpdate { .. } => "context_update",
            MessagePayload::Error { .. } => "error",
            MessagePayload::HealthCheck => "health_check",
            MessagePayload::HealthResponse { .. } => "health_response",
        }
    }
}

/// The envelope wrapping every orchestrator<->agent hop (spec §3.2).
/// Envelopes are neither persisted nor replayed; `message_id` exists purely
/// so a receiver can de-duplicate at-most-once deliveries if it chooses to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub message_id: MessageId,
    pub timestamp: DateTime<Utc>,
    pub source_agent: String,
    pub target_agent: String,
    pub session_id: Option<SessionId>,
    #[serde(flatten)]
    pub payload: MessagePayload,
}

impl MessageEnvelope {
    pub fn new(
        source_agent: impl Into<String>,
        target_agent: impl Into<String>,
        session_id: Option<SessionId>,
        payload: MessagePayload,
    ) -> Self {
        Self {
            message_id: MessageId::new(),
            timestamp: Utc::now(),
            source_agent: source_agent.into(),
            target_agent: target_agent.into(),
            session_id,
            payload,
        }
    }
}

/// Convenience alias for the loose string->string overrides `clarify`
/// accepts on the REST surface (spec §6.1) before they are folded into a
/// [`NwbMetadata`] via [`NwbMetadata::apply_overrides`].
pub type MetadataOverrides = HashMap<String, String>;
