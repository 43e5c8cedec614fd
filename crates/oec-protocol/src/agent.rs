//! Agent identity types shared by the registry, the router, and every agent binary.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The three agent specializations the orchestrator coordinates.
///
/// Closed on purpose: the workflow state machine in [`crate::session::WorkflowStage`]
/// is only valid with respect to exactly these three agents, and a closed enum lets
/// the compiler catch a typo in a handoff target instead of discovering it at runtime
/// as `agent_not_registered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Conversation,
    Conversion,
    Evaluation,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Conversation => "conversation",
            AgentType::Conversion => "conversion",
            AgentType::Evaluation => "evaluation",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conversation" => Ok(AgentType::Conversation),
            "conversion" => Ok(AgentType::Conversion),
            "evaluation" => Ok(AgentType::Evaluation),
            other => Err(format!("unknown agent_type: {other}")),
        }
    }
}

/// Liveness as last observed by the orchestrator. The registry does not poll
/// agents proactively (MVP, §5) — this reflects only the status reported at
/// registration time or inferred from a failed route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Healthy,
    Unreachable,
}

impl Default for AgentStatus {
    fn default() -> Self {
        AgentStatus::Healthy
    }
}

/// A registered agent's directory entry (§3.3). Held only in the orchestrator's
/// in-memory [`crate` registry] — never persisted, so agents must re-register
/// after an orchestrator restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Unique key the registry is keyed by. Re-registering the same name
    /// replaces the prior entry (last writer wins, §4.2).
    pub agent_name: String,
    pub agent_type: AgentType,
    /// Base URL the router POSTs envelopes to, e.g. `http://127.0.0.1:9001`.
    pub base_url: String,
    pub capabilities: HashSet<String>,
    #[serde(default)]
    pub status: AgentStatus,
}

impl AgentRecord {
    pub fn new(
        agent_name: impl Into<String>,
        agent_type: AgentType,
        base_url: impl Into<String>,
        capabilities: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            agent_type,
            base_url: base_url.into(),
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            status: AgentStatus::Healthy,
        }
    }
}
