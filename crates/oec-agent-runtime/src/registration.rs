//! Startup registration (spec §4.5 "Registration"): POST to the
//! orchestrator's internal `register_agent` endpoint once at process start,
//! and again on reconnection — best-effort; a missed re-register on both
//! sides requires a manual restart (spec: "MVP accepts that").

use oec_protocol::bearer_header;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::AgentRuntimeConfig;

#[derive(Serialize)]
struct RegisterAgentRequest<'a> {
    agent_name: &'a str,
    agent_type: oec_protocol::AgentType,
    capabilities: &'a [String],
    base_url: &'a str,
}

/// Attempt registration once. Returns `Ok(())` only on a 2xx response.
pub async fn register_once(
    http: &reqwest::Client,
    config: &AgentRuntimeConfig,
) -> Result<(), String> {
    let url = format!(
        "{}/internal/register_agent",
        config.orchestrator_base_url.trim_end_matches('/')
    );
    let body = RegisterAgentRequest {
        agent_name: &config.agent_name,
        agent_type: config.agent_type,
        capabilities: &config.capabilities,
        base_url: &config.base_url,
    };

    let response = http
        .post(&url)
        .header("Authorization", bearer_header(&config.bearer_token))
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        info!(agent_name = %config.agent_name, %url, "registered with orchestrator");
        Ok(())
    } else {
        Err(format!("orchestrator rejected registration: {}", response.status()))
    }
}

/// Register with a few immediate retries at startup — the orchestrator may
/// still be binding its listener when agent processes start concurrently
/// (a deployment-ordering wrinkle the spec doesn't address; bounded here so
/// a genuinely-down orchestrator still fails the agent process promptly).
pub async fn register_with_startup_retries(
    http: &reqwest::Client,
    config: &AgentRuntimeConfig,
    attempts: u32,
) -> Result<(), String> {
    let mut last_err = String::new();
    for attempt in 0..attempts.max(1) {
        match register_once(http, config).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                last_err = e;
                warn!(attempt = attempt + 1, attempts, error = %last_err, "registration attempt failed");
                tokio::time::sleep(std::time::Duration::from_secs(1 + attempt as u64)).await;
            }
        }
    }
    error!(agent_name = %config.agent_name, "exhausted registration attempts");
    Err(last_err)
}
