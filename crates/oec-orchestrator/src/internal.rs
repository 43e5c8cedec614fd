//! Internal, agent-facing surface (spec §6.2) plus the `/internal/agents`
//! listing SPEC_FULL adds for operability. Every handler here authenticates
//! the caller via the shared bearer secret and, where the caller's identity
//! matters (the patch and route_message endpoints), via an `X-Agent-Name`
//! header cross-checked against the registry — the spec's "agent identity
//! from source URL" (§4.4) taken literally would mean trusting whatever
//! `Host`/peer-address a reverse proxy hands us, which this workspace
//! doesn't assume is trustworthy.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use oec_protocol::{
    AgentRecord, AgentType, ContextPatch, MessageEnvelope, MessagePayload, SessionContext, SessionId,
};
use serde::Deserialize;

use crate::errors::{ApiError, InternalApiError};
use crate::state::AppState;
use crate::workflow;

fn require_bearer(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    let provided = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if oec_protocol::validate_bearer(expected, provided) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

/// Resolve the caller's agent identity from `X-Agent-Name`, checked against
/// the registry so a patch cannot be attributed to an agent that isn't (or
/// is no longer) registered.
async fn require_caller_identity(state: &AppState, headers: &HeaderMap) -> Result<AgentType, ApiError> {
    let name = headers
        .get("x-agent-name")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidPatch("missing X-Agent-Name header".to_string()))?;
    let record = state
        .registry
        .get(name)
        .await
        .map_err(|_| ApiError::AgentNotRegistered(name.to_string()))?;
    Ok(record.agent_type)
}

fn parse_session_id(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::InvalidPath(format!("malformed session id: {raw}")))
}

#[derive(Debug, Deserialize)]
pub struct RegisterAgentRequest {
    pub agent_name: String,
    pub agent_type: AgentType,
    pub capabilities: Vec<String>,
    pub base_url: String,
}

/// `POST /internal/register_agent` (spec §6.2, "Upsert").
pub async fn register_agent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterAgentRequest>,
) -> Result<Json<AgentRecord>, InternalApiError> {
    require_bearer(&headers, &state.config.bearer_token)?;
    let record = AgentRecord::new(body.agent_name, body.agent_type, body.base_url, body.capabilities);
    state.registry.register(record.clone()).await;
    Ok(Json(record))
}

/// `GET /internal/agents` (SPEC_FULL §3 supplement): the `/health` endpoint's
/// `agents_registered` listing, exposed standalone for agent-side tooling
/// that doesn't want the rest of the health payload.
pub async fn list_agents(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<AgentRecord>>, InternalApiError> {
    require_bearer(&headers, &state.config.bearer_token)?;
    Ok(Json(state.registry.list().await))
}

/// `GET /internal/sessions/{id}/context` (spec §6.2).
pub async fn get_context(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<SessionContext>, InternalApiError> {
    require_bearer(&headers, &state.config.bearer_token)?;
    let session_id = parse_session_id(&id)?;
    let ctx = state.store.get(session_id).await?;
    Ok(Json(ctx))
}

/// `PATCH /internal/sessions/{id}/context` (spec §6.2): validated against
/// §4.4 and applied atomically; a handoff patch immediately re-dispatches
/// the next agent the same way [`crate::rest::initialize`] does.
pub async fn patch_context(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<ContextPatch>,
) -> Result<Json<SessionContext>, InternalApiError> {
    require_bearer(&headers, &state.config.bearer_token)?;
    let source_agent = require_caller_identity(&state, &headers).await?;
    let session_id = parse_session_id(&id)?;

    let ctx = state.store.get(session_id).await?;
    let now = Utc::now();
    let outcome = workflow::apply_patch(ctx, source_agent, patch, now)?;
    outcome
        .ctx
        .check_invariants()
        .map_err(ApiError::InvalidPatch)?;
    state.store.update(outcome.ctx.clone()).await?;

    if let Some((next_agent, _)) = outcome.next_dispatch {
        let params = serde_json::json!({ "session_id": session_id.as_token() });
        let task = match next_agent {
            AgentType::Conversation => "handle_clarification",
            AgentType::Conversion => "convert_to_nwb",
            AgentType::Evaluation => "validate_nwb",
        };
        tokio::spawn(crate::dispatch::dispatch_and_await(
            state,
            session_id,
            next_agent,
            task.to_string(),
            params,
        ));
    }

    Ok(Json(outcome.ctx))
}

#[derive(Debug, Deserialize)]
pub struct RouteMessageRequest {
    pub target_agent: String,
    pub session_id: SessionId,
    pub payload: MessagePayload,
}

/// `POST /internal/route_message` (spec §6.2): a generic envelope relay one
/// agent uses to reach another through the orchestrator. The three concrete
/// agents in this workspace prefer the patch-embedded handoff in
/// [`patch_context`] instead, since it keeps the stage transition and the
/// next dispatch atomic; this endpoint exists for the literal contract and
/// for any future agent that needs to address another directly without
/// also mutating context.
pub async fn route_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RouteMessageRequest>,
) -> Result<Json<MessageEnvelope>, InternalApiError> {
    require_bearer(&headers, &state.config.bearer_token)?;
    let source_agent = require_caller_identity(&state, &headers).await?;

    let envelope = MessageEnvelope::new(
        source_agent.as_str(),
        body.target_agent,
        Some(body.session_id),
        body.payload,
    );
    let response = state.router.send(envelope, None).await?;
    Ok(Json(response))
}
