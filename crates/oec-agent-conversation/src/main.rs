//! The Conversation agent process (spec §4.5.1): format detection, dataset
//! structure validation, LLM-driven NWB metadata extraction, and the
//! clarification loop's re-extraction step.

mod dataset;
mod metadata;
mod tasks;

use std::sync::Arc;

use oec_agent_runtime::{register_with_startup_retries, AgentRuntimeConfig, ContextClient, DispatchTable};
use oec_llm::{HttpLlmClient, LlmConfig};
use oec_protocol::AgentType;
use tracing::info;

use tasks::{HandleClarificationHandler, InitializeSessionHandler};

const AGENT_NAME: &str = "conversation";
const ENV_PREFIX: &str = "CONVERSATION";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AgentRuntimeConfig::from_env(
        AGENT_NAME,
        AgentType::Conversation,
        vec![
            "session_initialization".to_string(),
            "format_detection".to_string(),
            "metadata_extraction".to_string(),
            "dataset_validation".to_string(),
        ],
        ENV_PREFIX,
    )
    .map_err(anyhow::Error::msg)?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(config.log_level.clone()))
        .init();

    let llm_config = LlmConfig::from_env(ENV_PREFIX).map_err(anyhow::Error::msg)?;
    let max_retries = llm_config.max_retries;
    let llm: Arc<dyn oec_llm::LlmClient> = Arc::new(HttpLlmClient::new(llm_config).map_err(anyhow::Error::msg)?);

    let context = Arc::new(ContextClient::new(
        config.orchestrator_base_url.clone(),
        config.bearer_token.clone(),
        config.agent_name.clone(),
    ));

    let dispatch = DispatchTable::new()
        .with_task(
            "initialize_session",
            Arc::new(InitializeSessionHandler {
                context: context.clone(),
                llm,
                max_retries,
            }),
        )
        .with_task(
            "handle_clarification",
            Arc::new(HandleClarificationHandler { context: context.clone() }),
        );

    let http = reqwest::Client::new();
    register_with_startup_retries(&http, &config, 5)
        .await
        .map_err(anyhow::Error::msg)?;

    info!(agent_name = %config.agent_name, port = config.port, "conversation agent starting");
    oec_agent_runtime::serve(config.agent_name.clone(), AgentType::Conversation, dispatch, config.port).await?;
    Ok(())
}
