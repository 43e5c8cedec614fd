//! The Message Router (spec §4.3): delivers typed [`oec_protocol::MessageEnvelope`]s
//! to registered agents over HTTP, with a bounded per-call timeout and
//! at-most-once delivery — no automatic retry lives here, only in `oec-llm`'s
//! backoff loop for the LLM call an agent makes while handling a task.
//!
//! Grounded on the teacher's `mcp_http_adapter` transport-over-HTTP shape,
//! generalized from tool-protocol calls to the orchestrator's own envelope
//! format.

mod errors;
mod router;

pub use errors::RouterError;
pub use router::{MessageRouter, DEFAULT_TIMEOUT, MAX_TIMEOUT};
