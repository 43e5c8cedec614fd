//! The Evaluation agent process (spec §4.5.3): validates the converted NWB
//! file, scores it, and performs the terminal transition to `completed`.

mod tasks;
mod validator;

use std::path::PathBuf;
use std::sync::Arc;

use oec_agent_runtime::{register_with_startup_retries, AgentRuntimeConfig, ContextClient, DispatchTable};
use oec_llm::{HttpLlmClient, LlmConfig};
use oec_protocol::AgentType;
use tracing::info;

use tasks::ValidateNwbHandler;
use validator::PlaceholderNwbValidator;

const AGENT_NAME: &str = "evaluation";
const ENV_PREFIX: &str = "EVALUATION";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AgentRuntimeConfig::from_env(
        AGENT_NAME,
        AgentType::Evaluation,
        vec![
            "nwb_validation".to_string(),
            "report_generation".to_string(),
            "validation_summary".to_string(),
        ],
        ENV_PREFIX,
    )
    .map_err(anyhow::Error::msg)?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(config.log_level.clone()))
        .init();

    let output_dir = PathBuf::from(std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "./output".to_string()));

    let llm_config = LlmConfig::from_env(ENV_PREFIX).map_err(anyhow::Error::msg)?;
    let max_retries = llm_config.max_retries;
    let llm: Arc<dyn oec_llm::LlmClient> = Arc::new(HttpLlmClient::new(llm_config).map_err(anyhow::Error::msg)?);

    let context = Arc::new(ContextClient::new(
        config.orchestrator_base_url.clone(),
        config.bearer_token.clone(),
        config.agent_name.clone(),
    ));

    let dispatch = DispatchTable::new().with_task(
        "validate_nwb",
        Arc::new(ValidateNwbHandler {
            context: context.clone(),
            llm,
            max_retries,
            validator: Arc::new(PlaceholderNwbValidator),
            output_dir,
        }),
    );

    let http = reqwest::Client::new();
    register_with_startup_retries(&http, &config, 5)
        .await
        .map_err(anyhow::Error::msg)?;

    info!(agent_name = %config.agent_name, port = config.port, "evaluation agent starting");
    oec_agent_runtime::serve(config.agent_name.clone(), AgentType::Evaluation, dispatch, config.port).await?;
    Ok(())
}
