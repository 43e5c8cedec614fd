use std::time::Duration;

use chrono::Utc;
use oec_protocol::{SessionContext, SessionId, WorkflowStage};
use oec_store::{SessionStore, SessionStoreConfig};

fn store(base: &tempfile::TempDir) -> SessionStore {
    SessionStore::new(SessionStoreConfig {
        durable_base_path: base.path().to_path_buf(),
        cache_ttl: Duration::from_secs(60 * 60 * 24),
    })
}

#[tokio::test]
async fn write_through_survives_cache_eviction() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    let id = SessionId::new();
    let ctx = SessionContext::new(id, Utc::now());
    store.create(ctx.clone()).await.unwrap();

    // Simulate the cache tier restarting / losing the entry.
    store.evict_from_cache(id).await;

    let reloaded = store.get(id).await.unwrap();
    assert_eq!(reloaded.session_id, ctx.session_id);
    assert_eq!(reloaded.workflow_stage, ctx.workflow_stage);
}

#[tokio::test]
async fn get_on_unknown_session_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let err = store.get(SessionId::new()).await.unwrap_err();
    assert!(matches!(err, oec_store::StoreError::NotFound(_)));
}

#[tokio::test]
async fn update_never_moves_last_updated_backward() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    let id = SessionId::new();
    let mut ctx = SessionContext::new(id, Utc::now());
    store.create(ctx.clone()).await.unwrap();
    let first_seen = store.get(id).await.unwrap().last_updated;

    // Attempt to roll last_updated backward — the store must clamp it.
    ctx.last_updated = ctx.created_at - chrono::Duration::days(1);
    ctx.workflow_stage = WorkflowStage::CollectingMetadata;
    ctx.current_agent = Some(oec_protocol::AgentType::Conversation);
    store.update(ctx).await.unwrap();

    let second_seen = store.get(id).await.unwrap();
    assert!(second_seen.last_updated >= first_seen);
    assert_eq!(second_seen.workflow_stage, WorkflowStage::CollectingMetadata);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let id = SessionId::new();
    store.delete(id).await.unwrap();
    store.delete(id).await.unwrap();
}

#[tokio::test]
async fn create_delete_create_matches_fresh_create_modulo_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let id = SessionId::new();
    let ctx = SessionContext::new(id, Utc::now());

    store.create(ctx.clone()).await.unwrap();
    store.delete(id).await.unwrap();
    store.create(ctx.clone()).await.unwrap();

    let reloaded = store.get(id).await.unwrap();
    assert_eq!(reloaded.session_id, ctx.session_id);
    assert_eq!(reloaded.workflow_stage, WorkflowStage::Initialized);
    assert!(reloaded.agent_history.is_empty());
}

#[tokio::test]
async fn read_your_writes_within_one_process() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let id = SessionId::new();
    let mut ctx = SessionContext::new(id, Utc::now());
    store.create(ctx.clone()).await.unwrap();

    ctx.workflow_stage = WorkflowStage::CollectingMetadata;
    ctx.current_agent = Some(oec_protocol::AgentType::Conversation);
    store.update(ctx.clone()).await.unwrap();

    let reloaded = store.get(id).await.unwrap();
    assert_eq!(reloaded.workflow_stage, WorkflowStage::CollectingMetadata);
}
