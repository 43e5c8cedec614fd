//! Orchestrator-level errors and their mapping onto HTTP status codes
//! (spec §6.1: "Errors return 4xx with `{error, detail}`... timeouts from
//! downstream are mapped to 504"; spec §7 taxonomy).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use oec_protocol::{ErrorCode, ErrorDetail};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown session")]
    UnknownSession,
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("session not yet completed")]
    NotCompleted,
    #[error("invalid patch: {0}")]
    InvalidPatch(String),
    #[error("agent not registered: {0}")]
    AgentNotRegistered(String),
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("downstream agent timed out: {0}")]
    GatewayTimeout(String),
    #[error("unauthorized")]
    Unauthorized,
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::UnknownSession => ErrorCode::UnknownSession,
            ApiError::InvalidPath(_) => ErrorCode::InvalidPath,
            ApiError::UnsupportedFormat(_) => ErrorCode::UnsupportedFormat,
            ApiError::InvalidState(_) => ErrorCode::InvalidState,
            ApiError::NotCompleted => ErrorCode::InvalidState,
            ApiError::InvalidPatch(_) => ErrorCode::InvalidPatch,
            ApiError::AgentNotRegistered(_) => ErrorCode::AgentNotRegistered,
            ApiError::BackendUnavailable(_) => ErrorCode::BackendUnavailable,
            ApiError::GatewayTimeout(_) => ErrorCode::TimeoutError,
            ApiError::Unauthorized => ErrorCode::InvalidState,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownSession => StatusCode::NOT_FOUND,
            ApiError::InvalidPath(_) | ApiError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidState(_) | ApiError::NotCompleted => StatusCode::CONFLICT,
            ApiError::InvalidPatch(_) => StatusCode::BAD_REQUEST,
            ApiError::AgentNotRegistered(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BackendUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorCode,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.code(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<oec_store::StoreError> for ApiError {
    fn from(err: oec_store::StoreError) -> Self {
        match err {
            oec_store::StoreError::NotFound(_) => ApiError::UnknownSession,
            oec_store::StoreError::BackendUnavailable(detail) => ApiError::BackendUnavailable(detail),
            oec_store::StoreError::CorruptRecord { detail, .. } => ApiError::BackendUnavailable(detail),
        }
    }
}

impl From<oec_router::RouterError> for ApiError {
    fn from(err: oec_router::RouterError) -> Self {
        match err {
            oec_router::RouterError::AgentNotRegistered(name) => ApiError::AgentNotRegistered(name),
            oec_router::RouterError::Timeout { agent, elapsed_ms } => {
                ApiError::GatewayTimeout(format!("{agent} after {elapsed_ms}ms"))
            }
            oec_router::RouterError::Transport { agent, detail } => {
                ApiError::BackendUnavailable(format!("{agent}: {detail}"))
            }
            oec_router::RouterError::Remote { agent, detail } => {
                ApiError::BackendUnavailable(format!("{agent}: {detail}"))
            }
            oec_router::RouterError::MalformedResponse { agent, detail } => {
                ApiError::BackendUnavailable(format!("{agent}: {detail}"))
            }
        }
    }
}

impl From<crate::workflow::WorkflowError> for ApiError {
    fn from(err: crate::workflow::WorkflowError) -> Self {
        ApiError::InvalidPatch(err.to_string())
    }
}

/// Same errors as [`ApiError`], but for the agent-facing internal surface
/// (spec §6.2), which is decoded by `ContextClient::decode_or_remote_error`
/// as [`ErrorDetail`] rather than the client REST surface's `{error,
/// detail}` body. Keeping this as a distinct response type stops the two
/// contracts drifting apart again.
pub struct InternalApiError(pub ApiError);

impl IntoResponse for InternalApiError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let body = ErrorDetail::new(self.0.code(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}

impl From<ApiError> for InternalApiError {
    fn from(err: ApiError) -> Self {
        InternalApiError(err)
    }
}

impl From<oec_store::StoreError> for InternalApiError {
    fn from(err: oec_store::StoreError) -> Self {
        InternalApiError(ApiError::from(err))
    }
}

impl From<oec_router::RouterError> for InternalApiError {
    fn from(err: oec_router::RouterError) -> Self {
        InternalApiError(ApiError::from(err))
    }
}

impl From<crate::workflow::WorkflowError> for InternalApiError {
    fn from(err: crate::workflow::WorkflowError) -> Self {
        InternalApiError(ApiError::from(err))
    }
}
