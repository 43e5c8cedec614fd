use chrono::Utc;
use oec_protocol::{
    AgentExecutionRecord, AgentType, ExecutionStatus, SessionContext, SessionId, WorkflowStage,
};

fn fresh() -> SessionContext {
    SessionContext::new(SessionId::new(), Utc::now())
}

#[test]
fn new_session_starts_initialized_with_no_current_agent() {
    let ctx = fresh();
    assert_eq!(ctx.workflow_stage, WorkflowStage::Initialized);
    assert!(ctx.current_agent.is_none());
    assert!(ctx.check_invariants().is_ok());
    assert_eq!(ctx.created_at, ctx.last_updated);
}

#[test]
fn current_agent_required_while_an_agent_holds_the_slot() {
    let mut ctx = fresh();
    ctx.workflow_stage = WorkflowStage::CollectingMetadata;
    assert!(ctx.check_invariants().is_err());
    ctx.current_agent = Some(AgentType::Conversation);
    assert!(ctx.check_invariants().is_ok());
}

#[test]
fn completed_requires_output_and_validation() {
    let mut ctx = fresh();
    ctx.workflow_stage = WorkflowStage::Completed;
    assert!(ctx.check_invariants().is_err());
}

#[test]
fn clarification_flag_requires_failed_stage_and_nonempty_prompt() {
    let mut ctx = fresh();
    ctx.requires_user_clarification = true;
    assert!(ctx.check_invariants().is_err());
    ctx.workflow_stage = WorkflowStage::Failed;
    assert!(ctx.check_invariants().is_err(), "still missing prompt");
    ctx.clarification_prompt = Some("unsupported_format: no settings file found".into());
    assert!(ctx.check_invariants().is_ok());
}

#[test]
fn transition_relation_matches_spec_diagram() {
    use WorkflowStage::*;
    assert!(WorkflowStage::is_valid_transition(None, Initialized));
    assert!(WorkflowStage::is_valid_transition(
        Some(Initialized),
        CollectingMetadata
    ));
    assert!(WorkflowStage::is_valid_transition(
        Some(CollectingMetadata),
        Converting
    ));
    assert!(WorkflowStage::is_valid_transition(Some(Converting), Evaluating));
    assert!(WorkflowStage::is_valid_transition(Some(Converting), Failed));
    assert!(WorkflowStage::is_valid_transition(Some(Evaluating), Completed));
    assert!(WorkflowStage::is_valid_transition(Some(Failed), Converting));

    // Illegal jumps.
    assert!(!WorkflowStage::is_valid_transition(Some(Initialized), Converting));
    assert!(!WorkflowStage::is_valid_transition(Some(Completed), Converting));
    assert!(!WorkflowStage::is_valid_transition(Some(Failed), Completed));
}

#[test]
fn progress_percentages_match_spec_table() {
    assert_eq!(WorkflowStage::Initialized.progress_percentage(), 10);
    assert_eq!(WorkflowStage::CollectingMetadata.progress_percentage(), 30);
    assert_eq!(WorkflowStage::Converting.progress_percentage(), 60);
    assert_eq!(WorkflowStage::Evaluating.progress_percentage(), 80);
    assert_eq!(WorkflowStage::Completed.progress_percentage(), 100);
    assert_eq!(WorkflowStage::Failed.progress_percentage(), 0);
}

#[test]
fn agent_history_append_only_prefix_property() {
    let mut ctx = fresh();
    let snapshot_1 = ctx.agent_history.clone();
    ctx.agent_history
        .push(AgentExecutionRecord::started(AgentType::Conversation, Utc::now()));
    let snapshot_2 = ctx.agent_history.clone();
    assert!(snapshot_1
        .iter()
        .zip(snapshot_2.iter())
        .all(|(a, b)| a.started_at == b.started_at && a.agent == b.agent));
    assert_eq!(snapshot_2.len(), snapshot_1.len() + 1);
    assert_eq!(snapshot_2[0].status, ExecutionStatus::InProgress);
}

#[test]
fn envelope_encoding_round_trips() {
    use oec_protocol::{MessageEnvelope, MessagePayload, TaskStatus};

    let envelope = MessageEnvelope::new(
        "conversation",
        "orchestrator",
        Some(SessionId::new()),
        MessagePayload::AgentResponse {
            status: TaskStatus::Success,
            result: Some(serde_json::json!({"ok": true})),
            error: None,
        },
    );
    let json = serde_json::to_string(&envelope).unwrap();
    let decoded: MessageEnvelope = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded.message_id, envelope.message_id);
    assert_eq!(decoded.payload.message_type(), "agent_response");
}
