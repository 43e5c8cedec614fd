//! Task handlers for the Conversation agent (spec §4.5.1).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use oec_agent_runtime::{ContextClient, TaskHandler};
use oec_llm::{call_llm, LlmClient};
use oec_protocol::{
    AgentType, ContextPatch, DatasetFormat, DatasetInfo, ErrorCode, ErrorDetail, FailureReport,
    HandoffRequest, SessionId,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::dataset;
use crate::metadata;

fn bad_request(message: impl Into<String>) -> ErrorDetail {
    ErrorDetail::new(ErrorCode::InvalidPath, message)
}

async fn patch_failure(
    context: &ContextClient,
    session_id: SessionId,
    technical_message: String,
    user_message: String,
) -> Result<Value, ErrorDetail> {
    let patch = ContextPatch {
        failure: Some(FailureReport {
            technical_message,
            technical_trace: None,
            user_message,
        }),
        ..Default::default()
    };
    context.patch_context(session_id, &patch).await?;
    Ok(json!({ "status": "failed" }))
}

pub struct InitializeSessionHandler {
    pub context: Arc<ContextClient>,
    pub llm: Arc<dyn LlmClient>,
    pub max_retries: u32,
}

#[async_trait]
impl TaskHandler for InitializeSessionHandler {
    async fn handle(&self, session_id: SessionId, parameters: Value) -> Result<Value, ErrorDetail> {
        let dataset_path = parameters
            .get("dataset_path")
            .and_then(Value::as_str)
            .ok_or_else(|| bad_request("initialize_session requires a dataset_path"))?
            .to_string();

        let detected = dataset::detect(Path::new(&dataset_path))
            .map_err(|e| bad_request(format!("could not read dataset_path {dataset_path}: {e}")))?;

        if detected.format != DatasetFormat::OpenEphys {
            warn!(%dataset_path, "dataset does not look like OpenEphys");
            return patch_failure(
                &self.context,
                session_id,
                format!("unsupported_format: {dataset_path} contains no recognizable OpenEphys settings file or recording files"),
                "This dataset does not look like an OpenEphys recording. It must contain a \
                 settings file (settings.xml or structure.oebin) and at least one raw recording \
                 file to proceed.".to_string(),
            )
            .await;
        }

        if let Err(reason) = dataset::validate_structure(&detected) {
            return patch_failure(
                &self.context,
                session_id,
                format!("invalid dataset structure: {reason}"),
                format!("The dataset could not be validated: {reason}."),
            )
            .await;
        }

        let (byte_size, file_count) = dataset::walk_stats(Path::new(&dataset_path))
            .map_err(|e| bad_request(format!("could not compute dataset size: {e}")))?;

        let dataset_info = DatasetInfo {
            path: dataset_path.clone(),
            format: DatasetFormat::OpenEphys,
            byte_size,
            file_count,
            channel_count: None,
            sample_rate_hz: None,
            duration_seconds: None,
            documentation_files: detected
                .documentation_files
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        };

        let extracted_metadata = if detected.documentation_files.is_empty() {
            // Step 3: "if no documentation files are present, produce an
            // empty MetadataExtractionResult" -- no LLM call needed.
            metadata::metadata_from_extraction(None, String::new())
        } else {
            let concatenated = dataset::concatenate_documentation(&detected.documentation_files);
            let prompt = metadata::extraction_prompt(&concatenated);
            match call_llm(
                self.llm.as_ref(),
                &prompt,
                Some(metadata::EXTRACTION_SYSTEM_MESSAGE),
                self.max_retries,
            )
            .await
            {
                Ok(completion) => {
                    let parsed = metadata::parse_llm_json(&completion.text);
                    metadata::metadata_from_extraction(parsed, completion.text)
                }
                Err(failed) => {
                    warn!(%session_id, error = %failed, "metadata extraction LLM call failed");
                    let detail: ErrorDetail = failed.clone().into();
                    return patch_failure(
                        &self.context,
                        session_id,
                        failed.to_string(),
                        format!(
                            "Metadata extraction failed: {}. You may retry or supply metadata manually via clarify.",
                            detail.message
                        ),
                    )
                    .await;
                }
            }
        };

        let patch = ContextPatch {
            dataset_info: Some(dataset_info),
            metadata: Some(extracted_metadata),
            handoff: Some(HandoffRequest {
                target_agent: AgentType::Conversion,
                task: "convert_to_nwb".to_string(),
            }),
            ..Default::default()
        };
        self.context.patch_context(session_id, &patch).await?;
        info!(%session_id, "initialize_session complete, handing off to conversion");
        Ok(json!({ "status": "success" }))
    }
}

pub struct HandleClarificationHandler {
    pub context: Arc<ContextClient>,
}

#[async_trait]
impl TaskHandler for HandleClarificationHandler {
    async fn handle(&self, session_id: SessionId, parameters: Value) -> Result<Value, ErrorDetail> {
        let updated_metadata: HashMap<String, String> = parameters
            .get("updated_metadata")
            .cloned()
            .map(|v| serde_json::from_value(v).unwrap_or_default())
            .unwrap_or_default();

        let ctx = self.context.get_context(session_id).await?;
        let mut metadata = ctx.metadata.unwrap_or_default();
        // Never mutates dataset_info (spec §4.5.1).
        metadata.apply_overrides(updated_metadata);

        let patch = ContextPatch {
            metadata: Some(metadata),
            handoff: Some(HandoffRequest {
                target_agent: AgentType::Conversion,
                task: "convert_to_nwb".to_string(),
            }),
            ..Default::default()
        };
        self.context.patch_context(session_id, &patch).await?;
        info!(%session_id, "handle_clarification complete, handing off to conversion");
        Ok(json!({ "status": "success" }))
    }
}
