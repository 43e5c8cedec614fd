//! Per-process agent configuration, read once at startup (spec §6.5:
//! "Per-agent ... port, provider token, model id, ... request timeout, max
//! retries"; SPEC_FULL §1 "Configuration": explicit struct from env vars, no
//! config-file parsing, no global settings singleton).

use oec_protocol::AgentType;

#[derive(Debug, Clone)]
pub struct AgentRuntimeConfig {
    pub agent_name: String,
    pub agent_type: AgentType,
    pub capabilities: Vec<String>,
    /// Port this agent's `/messages` and `/health` listener binds to.
    pub port: u16,
    /// This agent's own externally reachable base URL, sent at registration
    /// time so the orchestrator's router knows where to POST envelopes.
    pub base_url: String,
    pub orchestrator_base_url: String,
    /// Shared secret presented on every internal call to the orchestrator
    /// (SPEC_FULL §3, bearer auth).
    pub bearer_token: String,
    pub log_level: String,
}

impl AgentRuntimeConfig {
    /// Read `{PREFIX}_PORT`, `{PREFIX}_BASE_URL`, `ORCHESTRATOR_BASE_URL`,
    /// `ORCHESTRATOR_BEARER_TOKEN`, `LOG_LEVEL` from the environment.
    /// `prefix` is the agent name in SCREAMING_SNAKE_CASE, e.g. `CONVERSION`.
    pub fn from_env(
        agent_name: impl Into<String>,
        agent_type: AgentType,
        capabilities: Vec<String>,
        env_prefix: &str,
    ) -> Result<Self, String> {
        let var = |suffix: &str| std::env::var(format!("{env_prefix}_{suffix}"));

        let port: u16 = var("PORT")
            .map_err(|_| format!("{env_prefix}_PORT is required"))?
            .parse()
            .map_err(|_| format!("{env_prefix}_PORT must be a valid port number"))?;

        let base_url =
            var("BASE_URL").unwrap_or_else(|_| format!("http://127.0.0.1:{port}"));

        let orchestrator_base_url = std::env::var("ORCHESTRATOR_BASE_URL")
            .map_err(|_| "ORCHESTRATOR_BASE_URL is required".to_string())?;

        let bearer_token = std::env::var("ORCHESTRATOR_BEARER_TOKEN")
            .map_err(|_| "ORCHESTRATOR_BEARER_TOKEN is required".to_string())?;

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            agent_name: agent_name.into(),
            agent_type,
            capabilities,
            port,
            base_url,
            orchestrator_base_url,
            bearer_token,
            log_level,
        })
    }
}
