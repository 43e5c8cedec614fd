//! Shared application state handed to every axum handler (spec §4: the
//! orchestrator owns the session store, the agent registry, and the router).

use std::sync::Arc;

use oec_registry::AgentRegistry;
use oec_router::MessageRouter;
use oec_store::SessionStore;

use crate::config::OrchestratorConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: SessionStore,
    pub registry: Arc<AgentRegistry>,
    pub router: Arc<MessageRouter>,
    pub config: Arc<OrchestratorConfig>,
}

impl AppState {
    pub fn new(store: SessionStore, registry: Arc<AgentRegistry>, config: OrchestratorConfig) -> Self {
        let router = Arc::new(MessageRouter::new(registry.clone()));
        Self {
            store,
            registry,
            router,
            config: Arc::new(config),
        }
    }
}
