//! The Agent Registry (spec §4.2): a process-local, in-memory directory
//! mapping `agent_name -> AgentRecord`. There is no persistence — agents
//! re-register after an orchestrator restart, and a register call for an
//! already-known name simply replaces the prior entry (last writer wins;
//! adversarial hijack is out of scope).

use std::collections::HashMap;
use std::sync::Arc;

use oec_protocol::AgentRecord;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotRegistered;

impl std::fmt::Display for NotRegistered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "agent not registered")
    }
}

impl std::error::Error for NotRegistered {}

/// Thread-safe agent directory shared by the orchestrator's REST and
/// internal HTTP handlers via `Arc<AgentRegistry>`.
#[derive(Default)]
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, AgentRecord>>,
}

impl AgentRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Upsert: a duplicate name for a new endpoint replaces the prior entry.
    pub async fn register(&self, record: AgentRecord) {
        info!(agent_name = %record.agent_name, agent_type = %record.agent_type, base_url = %record.base_url, "agent registered");
        self.agents
            .write()
            .await
            .insert(record.agent_name.clone(), record);
    }

    pub async fn get(&self, name: &str) -> Result<AgentRecord, NotRegistered> {
        self.agents
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or(NotRegistered)
    }

    /// Snapshot of every registered agent, used by `/health`'s
    /// `agents_registered` field (spec §6.1) and the supplemental
    /// `/internal/agents` listing endpoint (SPEC_FULL §3).
    pub async fn list(&self) -> Vec<AgentRecord> {
        self.agents.read().await.values().cloned().collect()
    }

    /// Idempotent removal.
    pub async fn unregister(&self, name: &str) {
        self.agents.write().await.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oec_protocol::AgentType;

    fn record(name: &str, url: &str) -> AgentRecord {
        AgentRecord::new(name, AgentType::Conversation, url, ["format_detection"])
    }

    #[tokio::test]
    async fn register_then_get_round_trips() {
        let registry = AgentRegistry::new();
        registry.register(record("conversation", "http://a:1")).await;
        let got = registry.get("conversation").await.unwrap();
        assert_eq!(got.base_url, "http://a:1");
    }

    #[tokio::test]
    async fn duplicate_register_replaces_prior_entry() {
        let registry = AgentRegistry::new();
        registry.register(record("conversation", "http://a:1")).await;
        registry.register(record("conversation", "http://b:2")).await;
        let got = registry.get("conversation").await.unwrap();
        assert_eq!(got.base_url, "http://b:2");
        assert_eq!(registry.list().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_agent_is_not_registered() {
        let registry = AgentRegistry::new();
        assert!(registry.get("missing").await.is_err());
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let registry = AgentRegistry::new();
        registry.register(record("conversation", "http://a:1")).await;
        registry.unregister("conversation").await;
        registry.unregister("conversation").await;
        assert!(registry.get("conversation").await.is_err());
    }
}
