//! The per-agent dispatch table (spec §4.5 "Message intake": "Dispatch is a
//! plain table lookup per agent; unknown tasks return `failed` with
//! `unknown_task`").
//!
//! Replaces the teacher's abstract-base-class tool hierarchy
//! (`ToolProtocol`/`tool_protocols.rs`) with the capability interface the
//! spec's redesign flags call for (§9: "capability interface ... specialized
//! agents own a dispatch table from task name to handler function").

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use oec_protocol::{ErrorDetail, SessionId};

/// One task a specialized agent can execute (spec §4.5.1-3: `initialize_session`,
/// `handle_clarification`, `convert_to_nwb`, `validate_nwb`, ...).
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(
        &self,
        session_id: SessionId,
        parameters: serde_json::Value,
    ) -> Result<serde_json::Value, ErrorDetail>;
}

/// `task name -> handler`, built once at agent startup and shared across
/// every inbound `/messages` request via `Arc`.
#[derive(Default, Clone)]
pub struct DispatchTable {
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, task: impl Into<String>, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.insert(task.into(), handler);
        self
    }

    pub fn get(&self, task: &str) -> Option<&Arc<dyn TaskHandler>> {
        self.handlers.get(task)
    }
}
