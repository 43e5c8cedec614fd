//! The workflow state machine (spec §4.4): the orchestrator is the sole
//! writer of `workflow_stage`, `current_agent`, `agent_history`,
//! `requires_user_clarification`, and `clarification_prompt`. Agents only
//! ever submit a [`ContextPatch`]; this module is where it is validated
//! against [`WorkflowStage::is_valid_transition`] and applied atomically.

use chrono::{DateTime, Utc};
use oec_protocol::{
    AgentExecutionRecord, AgentType, ContextPatch, ExecutionStatus, SessionContext, WorkflowStage,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("illegal transition from {from:?} to {to:?}")]
    IllegalTransition {
        from: WorkflowStage,
        to: WorkflowStage,
    },
    #[error("no in-progress history entry for agent {0}")]
    NoInProgressEntry(AgentType),
}

/// The stage a fresh dispatch of `agent` enters, used by the two places that
/// start an agent run from scratch (the initial `initialize` dispatch and a
/// handoff-driven dispatch). `clarify`'s dispatch is the one exception in
/// the spec's diagram — it resumes at `converting` regardless of the fact
/// that the Conversation agent runs first — and is therefore handled by its
/// own caller ([`crate::rest::clarify`]) rather than this function.
pub fn stage_for_agent(agent: AgentType) -> WorkflowStage {
    match agent {
        AgentType::Conversation => WorkflowStage::CollectingMetadata,
        AgentType::Conversion => WorkflowStage::Converting,
        AgentType::Evaluation => WorkflowStage::Evaluating,
    }
}

/// Move to `to`, accepting either a stage-diagram edge from the spec or a
/// same-stage relabeling of `current_agent` (used when a clarify-triggered
/// Conversation run hands off to Conversion without the *stage* itself
/// advancing, since the diagram already placed it at `converting`).
fn transition(ctx: &mut SessionContext, to: WorkflowStage) -> Result<(), WorkflowError> {
    let from = ctx.workflow_stage;
    if to != from && !WorkflowStage::is_valid_transition(Some(from), to) {
        return Err(WorkflowError::IllegalTransition { from, to });
    }
    ctx.workflow_stage = to;
    Ok(())
}

/// Start `agent` executing against `ctx`: transitions the stage, sets
/// `current_agent`, opens a fresh `agent_history` entry, and clears any
/// stale clarification state (a fresh dispatch always supersedes it).
pub fn begin_agent_run(
    ctx: &mut SessionContext,
    agent: AgentType,
    target_stage: WorkflowStage,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    transition(ctx, target_stage)?;
    ctx.current_agent = Some(agent);
    ctx.agent_history.push(AgentExecutionRecord::started(agent, now));
    ctx.requires_user_clarification = false;
    ctx.clarification_prompt = None;
    ctx.last_updated = now;
    Ok(())
}

fn close_current_entry(
    ctx: &mut SessionContext,
    agent: AgentType,
    status: ExecutionStatus,
    error_message: Option<String>,
    error_trace: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    let entry = ctx
        .agent_history
        .iter_mut()
        .rev()
        .find(|e| e.agent == agent && e.status == ExecutionStatus::InProgress)
        .ok_or(WorkflowError::NoInProgressEntry(agent))?;
    entry.status = status;
    entry.ended_at = Some(now);
    entry.error_message = error_message;
    entry.error_trace = error_trace;
    Ok(())
}

fn apply_field_updates(ctx: &mut SessionContext, patch: &ContextPatch) {
    if let Some(v) = &patch.dataset_info {
        ctx.dataset_info = Some(v.clone());
    }
    if let Some(v) = &patch.metadata {
        ctx.metadata = Some(v.clone());
    }
    if let Some(v) = &patch.conversion_results {
        ctx.conversion_results = Some(v.clone());
    }
    if let Some(v) = &patch.validation_results {
        ctx.validation_results = Some(v.clone());
    }
    if let Some(v) = &patch.output_nwb_path {
        ctx.output_nwb_path = Some(v.clone());
    }
    if let Some(v) = &patch.output_report_path {
        ctx.output_report_path = Some(v.clone());
    }
}

/// Outcome of [`apply_patch`] telling the caller whether a new agent needs
/// to be dispatched next (spec §4.4: "the orchestrator ... performs the
/// routed execute").
pub struct PatchOutcome {
    pub ctx: SessionContext,
    pub next_dispatch: Option<(AgentType, WorkflowStage)>,
}

/// Apply one agent-submitted patch (spec §4.4, "Agents propose payload-scoped
/// updates ... the orchestrator applies them atomically after validating
/// stage consistency"). `source_agent` is the caller's authenticated
/// identity, not taken from the patch body.
pub fn apply_patch(
    mut ctx: SessionContext,
    source_agent: AgentType,
    patch: ContextPatch,
    now: DateTime<Utc>,
) -> Result<PatchOutcome, WorkflowError> {
    apply_field_updates(&mut ctx, &patch);

    if let Some(failure) = patch.failure {
        close_current_entry(
            &mut ctx,
            source_agent,
            ExecutionStatus::Failed,
            Some(failure.technical_message),
            failure.technical_trace,
            now,
        )?;
        transition(&mut ctx, WorkflowStage::Failed)?;
        ctx.current_agent = None;
        ctx.requires_user_clarification = true;
        ctx.clarification_prompt = Some(failure.user_message);
        ctx.last_updated = now;
        return Ok(PatchOutcome {
            ctx,
            next_dispatch: None,
        });
    }

    if patch.completes_workflow {
        close_current_entry(&mut ctx, source_agent, ExecutionStatus::Success, None, None, now)?;
        transition(&mut ctx, WorkflowStage::Completed)?;
        ctx.current_agent = None;
        ctx.last_updated = now;
        return Ok(PatchOutcome {
            ctx,
            next_dispatch: None,
        });
    }

    if let Some(handoff) = patch.handoff {
        close_current_entry(&mut ctx, source_agent, ExecutionStatus::Success, None, None, now)?;
        let target_stage = stage_for_agent(handoff.target_agent);
        begin_agent_run(&mut ctx, handoff.target_agent, target_stage, now)?;
        ctx.last_updated = now;
        return Ok(PatchOutcome {
            ctx,
            next_dispatch: Some((handoff.target_agent, target_stage)),
        });
    }

    ctx.last_updated = now;
    Ok(PatchOutcome {
        ctx,
        next_dispatch: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oec_protocol::{FailureReport, HandoffRequest, SessionId};

    fn fresh() -> SessionContext {
        let now = Utc::now();
        SessionContext::new(SessionId::new(), now)
    }

    #[test]
    fn initialize_dispatch_advances_to_collecting_metadata() {
        let mut ctx = fresh();
        begin_agent_run(
            &mut ctx,
            AgentType::Conversation,
            stage_for_agent(AgentType::Conversation),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(ctx.workflow_stage, WorkflowStage::CollectingMetadata);
        assert_eq!(ctx.current_agent, Some(AgentType::Conversation));
        assert_eq!(ctx.agent_history.len(), 1);
    }

    #[test]
    fn handoff_closes_prior_entry_and_opens_next() {
        let mut ctx = fresh();
        begin_agent_run(&mut ctx, AgentType::Conversation, WorkflowStage::CollectingMetadata, Utc::now()).unwrap();

        let patch = ContextPatch {
            handoff: Some(HandoffRequest {
                target_agent: AgentType::Conversion,
                task: "convert_to_nwb".to_string(),
            }),
            ..Default::default()
        };
        let outcome = apply_patch(ctx, AgentType::Conversation, patch, Utc::now()).unwrap();
        assert_eq!(outcome.ctx.workflow_stage, WorkflowStage::Converting);
        assert_eq!(outcome.ctx.current_agent, Some(AgentType::Conversion));
        assert_eq!(outcome.ctx.agent_history.len(), 2);
        assert_eq!(outcome.ctx.agent_history[0].status, ExecutionStatus::Success);
        assert_eq!(outcome.ctx.agent_history[1].status, ExecutionStatus::InProgress);
        assert!(matches!(outcome.next_dispatch, Some((AgentType::Conversion, WorkflowStage::Converting))));
    }

    #[test]
    fn failure_moves_to_failed_and_requires_clarification() {
        let mut ctx = fresh();
        begin_agent_run(&mut ctx, AgentType::Conversion, WorkflowStage::Converting, Utc::now()).unwrap();

        let patch = ContextPatch {
            failure: Some(FailureReport {
                technical_message: "boom".to_string(),
                technical_trace: Some("trace".to_string()),
                user_message: "Conversion failed; please check your dataset.".to_string(),
            }),
            ..Default::default()
        };
        let outcome = apply_patch(ctx, AgentType::Conversion, patch, Utc::now()).unwrap();
        assert_eq!(outcome.ctx.workflow_stage, WorkflowStage::Failed);
        assert!(outcome.ctx.current_agent.is_none());
        assert!(outcome.ctx.requires_user_clarification);
        assert_eq!(
            outcome.ctx.agent_history[0].error_message.as_deref(),
            Some("boom")
        );
    }

    #[test]
    fn clarify_then_handoff_is_a_same_stage_relabel() {
        let mut ctx = fresh();
        begin_agent_run(&mut ctx, AgentType::Conversion, WorkflowStage::Converting, Utc::now()).unwrap();
        let failure_patch = ContextPatch {
            failure: Some(FailureReport {
                technical_message: "boom".into(),
                technical_trace: None,
                user_message: "please retry".into(),
            }),
            ..Default::default()
        };
        let outcome = apply_patch(ctx, AgentType::Conversion, failure_patch, Utc::now()).unwrap();
        let mut ctx = outcome.ctx;
        assert_eq!(ctx.workflow_stage, WorkflowStage::Failed);

        // Clarify dispatch: Failed -> Converting, current_agent = Conversation.
        begin_agent_run(&mut ctx, AgentType::Conversation, WorkflowStage::Converting, Utc::now()).unwrap();
        assert_eq!(ctx.workflow_stage, WorkflowStage::Converting);

        // Conversation's handle_clarification hands off to Conversion, same stage.
        let handoff_patch = ContextPatch {
            handoff: Some(HandoffRequest {
                target_agent: AgentType::Conversion,
                task: "convert_to_nwb".into(),
            }),
            ..Default::default()
        };
        let outcome = apply_patch(ctx, AgentType::Conversation, handoff_patch, Utc::now()).unwrap();
        assert_eq!(outcome.ctx.workflow_stage, WorkflowStage::Converting);
        assert_eq!(outcome.ctx.current_agent, Some(AgentType::Conversion));
    }

    #[test]
    fn completes_workflow_transitions_to_completed() {
        let mut ctx = fresh();
        begin_agent_run(&mut ctx, AgentType::Evaluation, WorkflowStage::Evaluating, Utc::now()).unwrap();
        let patch = ContextPatch {
            output_report_path: Some("out/report.json".to_string()),
            completes_workflow: true,
            ..Default::default()
        };
        let outcome = apply_patch(ctx, AgentType::Evaluation, patch, Utc::now()).unwrap();
        assert_eq!(outcome.ctx.workflow_stage, WorkflowStage::Completed);
        assert!(outcome.ctx.current_agent.is_none());
    }
}
