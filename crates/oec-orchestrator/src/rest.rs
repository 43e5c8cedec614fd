//! Client-facing REST surface (spec §6.1), mounted under `/api/v1`.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use oec_protocol::{
    AgentRecord, AgentType, MetadataOverrides, SessionId, ValidationIssue, ValidationStatus,
    WorkflowStage,
};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::state::AppState;
use crate::workflow;

fn parse_session_id(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::InvalidPath(format!("malformed session id: {raw}")))
}

#[derive(Debug, Deserialize)]
pub struct InitializeRequest {
    pub dataset_path: String,
}

#[derive(Debug, Serialize)]
pub struct InitializeResponse {
    pub session_id: SessionId,
    pub workflow_stage: WorkflowStage,
    pub message: String,
}

/// `POST /sessions/initialize` (spec §6.1): creates the session and returns
/// as soon as dispatch to the Conversation agent has begun — the caller
/// observes progress by polling `status`.
pub async fn initialize(
    State(state): State<AppState>,
    Json(body): Json<InitializeRequest>,
) -> Result<Json<InitializeResponse>, ApiError> {
    if body.dataset_path.trim().is_empty() {
        return Err(ApiError::InvalidPath("dataset_path must not be empty".to_string()));
    }

    let now = Utc::now();
    let session_id = SessionId::new();
    let mut ctx = oec_protocol::SessionContext::new(session_id, now);
    workflow::begin_agent_run(
        &mut ctx,
        AgentType::Conversation,
        workflow::stage_for_agent(AgentType::Conversation),
        now,
    )?;
    let workflow_stage = ctx.workflow_stage;
    state.store.create(ctx).await?;

    let params = serde_json::json!({ "dataset_path": body.dataset_path });
    tokio::spawn(crate::dispatch::dispatch_and_await(
        state,
        session_id,
        AgentType::Conversation,
        "initialize_session".to_string(),
        params,
    ));

    Ok(Json(InitializeResponse {
        session_id,
        workflow_stage,
        message: "session initialized; conversation agent dispatched".to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub session_id: SessionId,
    pub workflow_stage: WorkflowStage,
    pub progress_percentage: u8,
    pub status_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_agent: Option<AgentType>,
    pub requires_clarification: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarification_prompt: Option<String>,
}

fn status_message(stage: WorkflowStage) -> String {
    match stage {
        WorkflowStage::Initialized => "session created".to_string(),
        WorkflowStage::CollectingMetadata => "detecting format and extracting metadata".to_string(),
        WorkflowStage::Converting => "converting dataset to NWB".to_string(),
        WorkflowStage::Evaluating => "validating converted file".to_string(),
        WorkflowStage::Completed => "conversion complete".to_string(),
        WorkflowStage::Failed => "awaiting clarification".to_string(),
    }
}

/// `GET /sessions/{id}/status` (spec §6.1).
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session_id = parse_session_id(&id)?;
    let ctx = state.store.get(session_id).await?;
    Ok(Json(StatusResponse {
        session_id: ctx.session_id,
        workflow_stage: ctx.workflow_stage,
        progress_percentage: ctx.workflow_stage.progress_percentage(),
        status_message: status_message(ctx.workflow_stage),
        current_agent: ctx.current_agent,
        requires_clarification: ctx.requires_user_clarification,
        clarification_prompt: ctx.clarification_prompt,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ClarifyRequest {
    pub user_input: String,
    #[serde(default)]
    pub updated_metadata: Option<MetadataOverrides>,
}

#[derive(Debug, Serialize)]
pub struct ClarifyResponse {
    pub message: String,
    pub workflow_stage: WorkflowStage,
}

/// `POST /sessions/{id}/clarify` (spec §6.1). Only legal when the session is
/// actually waiting on the user (`requires_user_clarification`); the special
/// `failed -> converting` edge and the re-dispatch to Conversation's
/// `handle_clarification` task both happen here.
pub async fn clarify(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ClarifyRequest>,
) -> Result<Json<ClarifyResponse>, ApiError> {
    let session_id = parse_session_id(&id)?;
    let mut ctx = state.store.get(session_id).await?;

    if !ctx.requires_user_clarification {
        return Err(ApiError::InvalidState(
            "session is not awaiting clarification".to_string(),
        ));
    }

    let now = Utc::now();
    workflow::begin_agent_run(&mut ctx, AgentType::Conversation, WorkflowStage::Converting, now)?;
    let workflow_stage = ctx.workflow_stage;
    state.store.update(ctx).await?;

    let params = serde_json::json!({
        "user_input": body.user_input,
        "updated_metadata": body.updated_metadata.unwrap_or_default(),
    });
    tokio::spawn(crate::dispatch::dispatch_and_await(
        state,
        session_id,
        AgentType::Conversation,
        "handle_clarification".to_string(),
        params,
    ));

    Ok(Json(ClarifyResponse {
        message: "clarification received; resuming pipeline".to_string(),
        workflow_stage,
    }))
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub session_id: SessionId,
    pub nwb_file_path: String,
    pub validation_report_path: String,
    pub overall_status: ValidationStatus,
    pub summary: String,
    pub validation_issues: Vec<ValidationIssue>,
}

/// `GET /sessions/{id}/result` (spec §6.1).
pub async fn result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResultResponse>, ApiError> {
    let session_id = parse_session_id(&id)?;
    let ctx = state.store.get(session_id).await?;

    if ctx.workflow_stage != WorkflowStage::Completed {
        return Err(ApiError::NotCompleted);
    }
    let validation = ctx
        .validation_results
        .ok_or_else(|| ApiError::InvalidState("completed session missing validation_results".to_string()))?;

    Ok(Json(ResultResponse {
        session_id: ctx.session_id,
        nwb_file_path: ctx.output_nwb_path.unwrap_or_default(),
        validation_report_path: ctx.output_report_path.unwrap_or_default(),
        overall_status: validation.overall_status,
        summary: validation.summary,
        validation_issues: validation.issues,
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub agents_registered: Vec<AgentRecord>,
    /// Named `redis_connected` per spec §6.1's response contract. This
    /// orchestrator has no separate Redis process to report on (spec §9
    /// carries it forward only as an open question); the field reports the
    /// in-process cache tier's health under the spec's name. See DESIGN.md.
    pub redis_connected: bool,
}

/// `GET /health` (spec §6.1).
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        agents_registered: state.registry.list().await,
        redis_connected: true,
    })
}
