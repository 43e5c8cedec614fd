//! The agent's HTTP listener (spec §6.3 "Agent surface"): `POST /messages`
//! dispatches an inbound envelope on `payload.task`; `GET /health` answers
//! liveness. Graceful shutdown on SIGINT/SIGTERM (SPEC_FULL §3 supplement).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use oec_protocol::{AgentType, ErrorCode, ErrorDetail, MessageEnvelope, MessagePayload, TaskStatus};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::dispatch::DispatchTable;

struct AgentServerState {
    agent_name: String,
    agent_type: AgentType,
    dispatch: DispatchTable,
}

/// Build and serve the agent's `/messages` + `/health` listener until a
/// shutdown signal arrives.
pub async fn serve(
    agent_name: impl Into<String>,
    agent_type: AgentType,
    dispatch: DispatchTable,
    port: u16,
) -> std::io::Result<()> {
    let state = Arc::new(AgentServerState {
        agent_name: agent_name.into(),
        agent_type,
        dispatch,
    });

    let app = Router::new()
        .route("/messages", post(handle_message))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "agent listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut signal) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            signal.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, draining in-flight requests");
}

async fn handle_health(State(state): State<Arc<AgentServerState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "agent_name": state.agent_name,
        "agent_type": state.agent_type,
    }))
}

async fn handle_message(
    State(state): State<Arc<AgentServerState>>,
    Json(envelope): Json<MessageEnvelope>,
) -> Json<MessageEnvelope> {
    let response_payload = match envelope.payload {
        MessagePayload::AgentExecute { task, parameters } => {
            dispatch_execute(&state, &task, envelope.session_id, parameters).await
        }
        MessagePayload::HealthCheck => MessagePayload::HealthResponse {
            agent_name: state.agent_name.clone(),
            agent_type: state.agent_type,
            status: "healthy".to_string(),
        },
        other => {
            warn!(message_type = other.message_type(), "agent received an unsupported message type");
            MessagePayload::Error {
                detail: ErrorDetail::new(
                    ErrorCode::UnknownTask,
                    format!("agent does not accept message_type {}", other.message_type()),
                ),
            }
        }
    };

    Json(MessageEnvelope::new(
        state.agent_name.clone(),
        envelope.source_agent,
        envelope.session_id,
        response_payload,
    ))
}

async fn dispatch_execute(
    state: &AgentServerState,
    task: &str,
    session_id: Option<oec_protocol::SessionId>,
    parameters: serde_json::Value,
) -> MessagePayload {
    let Some(session_id) = session_id else {
        return MessagePayload::AgentResponse {
            status: TaskStatus::Failed,
            result: None,
            error: Some(ErrorDetail::new(
                ErrorCode::InvalidState,
                "agent_execute requires a session_id",
            )),
        };
    };

    let Some(handler) = state.dispatch.get(task) else {
        return MessagePayload::AgentResponse {
            status: TaskStatus::Failed,
            result: None,
            error: Some(ErrorDetail::new(
                ErrorCode::UnknownTask,
                format!("no handler registered for task {task}"),
            )),
        };
    };

    match handler.handle(session_id, parameters).await {
        Ok(result) => MessagePayload::AgentResponse {
            status: TaskStatus::Success,
            result: Some(result),
            error: None,
        },
        Err(detail) => MessagePayload::AgentResponse {
            status: TaskStatus::Failed,
            result: None,
            error: Some(detail),
        },
    }
}
