//! Fire-and-forget agent dispatch used by the REST handlers that start an
//! agent run (`initialize`, `clarify`) and by [`crate::internal`] when a
//! patch's handoff immediately starts the next agent.
//!
//! The dispatched agent is responsible for patching its own outcome back
//! into the context before its HTTP response returns (spec §4.4: "agents
//! propose payload-scoped updates ... via the internal patch endpoint").
//! This function only needs to step in when the dispatch itself never
//! reaches the agent — unreachable, timed out, or the agent's process
//! errored before it could patch anything.

use oec_protocol::{AgentType, ContextPatch, FailureReport, SessionId};
use tracing::{error, warn};

use crate::state::AppState;
use crate::workflow;

pub async fn dispatch_and_await(
    state: AppState,
    session_id: SessionId,
    agent: AgentType,
    task: String,
    parameters: serde_json::Value,
) {
    // Convention: every agent registers under the name matching its
    // AgentType::as_str() ("conversation", "conversion", "evaluation").
    let target = agent.as_str();
    let outcome = state
        .router
        .execute("orchestrator", target, session_id, task, parameters, None)
        .await;

    let Err(err) = outcome else {
        // The agent reached us and is expected to have already patched the
        // context (or to do so asynchronously right after responding).
        return;
    };

    warn!(session_id = %session_id, agent = %agent, error = %err, "agent dispatch failed before it could patch context");

    let ctx = match state.store.get(session_id).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(session_id = %session_id, error = %e, "could not load session to record dispatch failure");
            return;
        }
    };

    let patch = ContextPatch {
        failure: Some(FailureReport {
            technical_message: err.to_string(),
            technical_trace: None,
            user_message: format!(
                "The {target} agent could not be reached. Please try again once it is back online."
            ),
        }),
        ..Default::default()
    };

    let now = chrono::Utc::now();
    match workflow::apply_patch(ctx, agent, patch, now) {
        Ok(result) => {
            if let Err(e) = state.store.update(result.ctx).await {
                error!(session_id = %session_id, error = %e, "failed to persist dispatch-failure patch");
            }
        }
        Err(e) => {
            error!(session_id = %session_id, error = %e, "failed to apply dispatch-failure patch");
        }
    }
}
