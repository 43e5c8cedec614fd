//! The Evaluation agent's single task (spec §4.5.3).

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use oec_agent_runtime::{ContextClient, TaskHandler};
use oec_llm::{call_llm, LlmClient};
use oec_protocol::{ContextPatch, ErrorCode, ErrorDetail, FailureReport, IssueCounts, ValidationResults};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::validator::NwbValidator;

const SUMMARY_SYSTEM_MESSAGE: &str = "You summarize NWB validation results for a researcher. \
State the overall status, the most important issues, and actionable recommendations. \
Respond in at most 150 words.";

pub struct ValidateNwbHandler {
    pub context: Arc<ContextClient>,
    pub llm: Arc<dyn LlmClient>,
    pub max_retries: u32,
    pub validator: Arc<dyn NwbValidator>,
    pub output_dir: PathBuf,
}

#[async_trait]
impl TaskHandler for ValidateNwbHandler {
    async fn handle(&self, session_id: oec_protocol::SessionId, _parameters: Value) -> Result<Value, ErrorDetail> {
        let ctx = self.context.get_context(session_id).await?;
        let nwb_path = ctx
            .output_nwb_path
            .ok_or_else(|| ErrorDetail::new(ErrorCode::InvalidState, "validate_nwb requires output_nwb_path"))?;
        let nwb_path = PathBuf::from(nwb_path);

        if tokio::fs::metadata(&nwb_path).await.is_err() {
            let message = format!("NWB file does not exist at {}", nwb_path.display());
            warn!(%session_id, %message);
            let patch = ContextPatch {
                failure: Some(FailureReport {
                    technical_message: message.clone(),
                    technical_trace: None,
                    user_message: "The converted NWB file could not be found for validation.".to_string(),
                }),
                ..Default::default()
            };
            self.context.patch_context(session_id, &patch).await?;
            return Ok(json!({ "status": "failed" }));
        }

        let issues = match self.validator.validate(&nwb_path).await {
            Ok(issues) => issues,
            Err(validator_err) => {
                warn!(%session_id, error = %validator_err.message, "validator raised");
                let patch = ContextPatch {
                    failure: Some(FailureReport {
                        technical_message: validator_err.message.clone(),
                        technical_trace: Some(validator_err.trace),
                        user_message: format!(
                            "Validation could not be completed: {}.",
                            validator_err.message
                        ),
                    }),
                    ..Default::default()
                };
                self.context.patch_context(session_id, &patch).await?;
                return Ok(json!({ "status": "failed" }));
            }
        };

        let issue_counts = IssueCounts::tally(&issues);
        let overall_status = issue_counts.overall_status();
        let best_practices_score = issue_counts.best_practices_score();
        let metadata_completeness = ctx.metadata.as_ref().map(|m| m.completeness_score()).unwrap_or(0.0);

        let report_path = self.output_dir.join(format!("{session_id}_validation_report.json"));
        let report_document = json!({
            "session_id": session_id.to_string(),
            "overall_status": overall_status,
            "issue_counts": issue_counts,
            "issues": issues,
            "metadata_completeness": metadata_completeness,
            "best_practices_score": best_practices_score,
        });
        let report_bytes = serde_json::to_vec_pretty(&report_document)
            .map_err(|e| ErrorDetail::new(ErrorCode::BackendUnavailable, e.to_string()))?;
        if let Some(parent) = report_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ErrorDetail::new(ErrorCode::BackendUnavailable, e.to_string()))?;
        }
        tokio::fs::write(&report_path, &report_bytes)
            .await
            .map_err(|e| ErrorDetail::new(ErrorCode::BackendUnavailable, e.to_string()))?;

        let top_issues: Vec<String> = issues.iter().take(5).map(|i| format!("{}: {}", i.check_name, i.message)).collect();
        let prompt = format!(
            "Overall status: {overall_status:?}. Best-practices score: {best_practices_score:.2}. \
            Metadata completeness: {metadata_completeness:.2}. Top issues: {}.",
            if top_issues.is_empty() { "none".to_string() } else { top_issues.join("; ") }
        );
        let summary = match call_llm(self.llm.as_ref(), &prompt, Some(SUMMARY_SYSTEM_MESSAGE), self.max_retries).await
        {
            Ok(completion) => completion.text,
            Err(_) => format!(
                "Validation finished with status {overall_status:?} ({} issues).",
                issues.len()
            ),
        };

        let results = ValidationResults {
            overall_status,
            issue_counts,
            issues,
            metadata_completeness,
            best_practices_score,
            report_path: report_path.display().to_string(),
            summary,
        };
        let patch = ContextPatch {
            validation_results: Some(results),
            output_report_path: Some(report_path.display().to_string()),
            completes_workflow: true,
            ..Default::default()
        };
        self.context.patch_context(session_id, &patch).await?;
        info!(%session_id, "validate_nwb complete, workflow completed");
        Ok(json!({ "status": "success" }))
    }
}
