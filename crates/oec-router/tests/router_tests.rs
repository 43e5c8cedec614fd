use std::time::Duration;

use oec_protocol::{AgentRecord, AgentType, MessageEnvelope, MessagePayload, SessionId, TaskStatus};
use oec_registry::AgentRegistry;
use oec_router::{MessageRouter, RouterError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn registry_with(name: &str, base_url: &str) -> std::sync::Arc<AgentRegistry> {
    let registry = AgentRegistry::new();
    registry
        .register(AgentRecord::new(name, AgentType::Conversion, base_url, [
            "openephys_conversion",
        ]))
        .await;
    registry
}

#[tokio::test]
async fn send_routes_to_registered_agent_base_url() {
    let server = MockServer::start().await;
    let response_envelope = MessageEnvelope::new(
        "conversion",
        "orchestrator",
        None,
        MessagePayload::AgentResponse {
            status: TaskStatus::Success,
            result: Some(serde_json::json!({"ok": true})),
            error: None,
        },
    );
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response_envelope))
        .mount(&server)
        .await;

    let registry = registry_with("conversion", &server.uri()).await;
    let router = MessageRouter::new(registry);

    let req = MessageEnvelope::new(
        "orchestrator",
        "conversion",
        Some(SessionId::new()),
        MessagePayload::AgentExecute {
            task: "convert_to_nwb".to_string(),
            parameters: serde_json::json!({}),
        },
    );

    let got = router.send(req, None).await.unwrap();
    match got.payload {
        MessagePayload::AgentResponse { status, .. } => assert_eq!(status, TaskStatus::Success),
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn send_to_unknown_agent_is_agent_not_registered() {
    let registry = AgentRegistry::new();
    let router = MessageRouter::new(registry);
    let req = MessageEnvelope::new(
        "orchestrator",
        "conversion",
        None,
        MessagePayload::HealthCheck,
    );
    let err = router.send(req, None).await.unwrap_err();
    assert!(matches!(err, RouterError::AgentNotRegistered(name) if name == "conversion"));
}

#[tokio::test]
async fn remote_error_payload_surfaces_as_remote_error() {
    let server = MockServer::start().await;
    let error_envelope = MessageEnvelope::new(
        "conversion",
        "orchestrator",
        None,
        MessagePayload::Error {
            detail: oec_protocol::ErrorDetail::new(
                oec_protocol::ErrorCode::ConversionFailed,
                "corrupt recording",
            ),
        },
    );
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&error_envelope))
        .mount(&server)
        .await;

    let registry = registry_with("conversion", &server.uri()).await;
    let router = MessageRouter::new(registry);
    let req = MessageEnvelope::new("orchestrator", "conversion", None, MessagePayload::HealthCheck);

    let err = router.send(req, None).await.unwrap_err();
    assert!(matches!(err, RouterError::Remote { .. }));
    assert_eq!(err.code(), oec_protocol::ErrorCode::ConversionFailed);
}

#[tokio::test]
async fn timeout_maps_to_timeout_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let registry = registry_with("conversion", &server.uri()).await;
    let router = MessageRouter::new(registry);
    let req = MessageEnvelope::new("orchestrator", "conversion", None, MessagePayload::HealthCheck);

    let err = router
        .send(req, Some(Duration::from_millis(20)))
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::Timeout { .. }));
}

#[tokio::test]
async fn execute_builds_agent_execute_envelope() {
    let server = MockServer::start().await;
    let response_envelope = MessageEnvelope::new(
        "conversion",
        "orchestrator",
        None,
        MessagePayload::AgentResponse {
            status: TaskStatus::Success,
            result: None,
            error: None,
        },
    );
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response_envelope))
        .mount(&server)
        .await;

    let registry = registry_with("conversion", &server.uri()).await;
    let router = MessageRouter::new(registry);

    let got = router
        .execute(
            "orchestrator",
            "conversion",
            SessionId::new(),
            "convert_to_nwb",
            serde_json::json!({"dataset_path": "/data/rec1"}),
            None,
        )
        .await
        .unwrap();

    assert!(matches!(got.payload, MessagePayload::AgentResponse { .. }));
}
