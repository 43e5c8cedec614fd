//! Wire types shared between the orchestrator and its three agent processes.
//!
//! This crate holds no I/O and no business logic — it is the vocabulary the
//! rest of the workspace talks in: [`session::SessionContext`] (the
//! authoritative per-run record), [`envelope::MessageEnvelope`] /
//! [`envelope::MessagePayload`] (the typed request/response wrapper every
//! HTTP hop carries), [`agent::AgentRecord`] (a registry entry), and
//! [`errors::ErrorCode`] (the shared failure vocabulary).
//!
//! Kept separate from `oec-store`/`oec-router`/`oec-agent-runtime`: every
//! process in this system — orchestrator and all three agents — depends on
//! it, but it depends on nothing beyond `serde`/`chrono`/`uuid`.

pub mod agent;
pub mod auth;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod session;

pub use agent::{AgentRecord, AgentStatus, AgentType};
pub use auth::{bearer_header, validate_bearer};
pub use envelope::{
    ContextPatch, FailureReport, HandoffRequest, MessageEnvelope, MessagePayload, MetadataOverrides,
    TaskStatus,
};
pub use errors::{ErrorCode, ErrorDetail};
pub use ids::{MessageId, SessionId};
pub use session::{
    AgentExecutionRecord, ConversionResults, DatasetFormat, DatasetInfo, ExecutionStatus,
    ExtractionConfidence, IssueCounts, IssueSeverity, MetadataField, NwbMetadata, SessionContext,
    ValidationIssue, ValidationResults, ValidationStatus, WorkflowStage,
};
