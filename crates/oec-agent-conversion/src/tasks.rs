//! The Conversion agent's single task (spec §4.5.2).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use oec_agent_runtime::{ContextClient, TaskHandler};
use oec_llm::{call_llm, LlmClient};
use oec_protocol::{
    AgentType, ContextPatch, ConversionResults, ErrorCode, ErrorDetail, FailureReport, HandoffRequest,
    SessionId,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::conversion_lib::ConversionLibrary;
use crate::nwb_build;

const ERROR_EXPLANATION_SYSTEM_MESSAGE: &str = "You write short, actionable remediation notes for \
a researcher who is not a software engineer. Respond in at most 200 words.";

pub struct ConvertToNwbHandler {
    pub context: Arc<ContextClient>,
    pub llm: Arc<dyn LlmClient>,
    pub max_retries: u32,
    pub conversion_lib: Arc<dyn ConversionLibrary>,
    pub output_dir: PathBuf,
}

#[async_trait]
impl TaskHandler for ConvertToNwbHandler {
    async fn handle(&self, session_id: SessionId, _parameters: Value) -> Result<Value, ErrorDetail> {
        let ctx = self.context.get_context(session_id).await?;
        let dataset_info = ctx
            .dataset_info
            .ok_or_else(|| ErrorDetail::new(ErrorCode::InvalidState, "convert_to_nwb requires dataset_info"))?;
        let metadata = ctx
            .metadata
            .ok_or_else(|| ErrorDetail::new(ErrorCode::InvalidState, "convert_to_nwb requires metadata"))?;

        let subject = nwb_build::subject_block(&metadata);
        let file_level = nwb_build::file_level_block(&metadata);
        let device = nwb_build::device_block(&metadata);
        let output_path = self.output_dir.join(format!("{session_id}.nwb"));

        let started = Instant::now();
        match self
            .conversion_lib
            .convert(&dataset_info, &subject, &file_level, &device, &output_path)
            .await
        {
            Ok(outcome) => {
                let results = ConversionResults {
                    duration_seconds: outcome.duration_seconds,
                    warnings: outcome.warnings,
                    errors: Vec::new(),
                    conversion_log: outcome.log,
                    user_message: None,
                };
                let patch = ContextPatch {
                    conversion_results: Some(results),
                    output_nwb_path: Some(output_path.display().to_string()),
                    handoff: Some(HandoffRequest {
                        target_agent: AgentType::Evaluation,
                        task: "validate_nwb".to_string(),
                    }),
                    ..Default::default()
                };
                self.context.patch_context(session_id, &patch).await?;
                info!(%session_id, "convert_to_nwb complete, handing off to evaluation");
                Ok(json!({ "status": "success" }))
            }
            Err(lib_err) => {
                warn!(%session_id, error = %lib_err.message, "conversion library raised");

                let prompt = format!(
                    "Explain this OpenEphys-to-NWB conversion failure and suggest next steps: {}",
                    lib_err.message
                );
                let user_message = match call_llm(
                    self.llm.as_ref(),
                    &prompt,
                    Some(ERROR_EXPLANATION_SYSTEM_MESSAGE),
                    self.max_retries,
                )
                .await
                {
                    Ok(completion) => completion.text,
                    Err(_) => format!(
                        "The conversion failed: {}. Please check the dataset and retry.",
                        lib_err.message
                    ),
                };

                let results = ConversionResults {
                    duration_seconds: started.elapsed().as_secs_f64(),
                    warnings: Vec::new(),
                    errors: vec![lib_err.message.clone()],
                    conversion_log: lib_err.trace.clone(),
                    user_message: Some(user_message.clone()),
                };
                let patch = ContextPatch {
                    conversion_results: Some(results),
                    failure: Some(FailureReport {
                        technical_message: lib_err.message,
                        technical_trace: Some(lib_err.trace),
                        user_message,
                    }),
                    ..Default::default()
                };
                self.context.patch_context(session_id, &patch).await?;
                Ok(json!({ "status": "failed" }))
            }
        }
    }
}
