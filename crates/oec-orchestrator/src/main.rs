//! The orchestrator process: REST surface to clients, internal surface to
//! agents, workflow-stage enforcement, and session lifecycle (spec §2, §6).

mod config;
mod dispatch;
mod errors;
mod internal;
mod rest;
mod state;
mod workflow;

use axum::routing::{get, post};
use axum::Router;
use oec_registry::AgentRegistry;
use oec_store::{SessionStore, SessionStoreConfig};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::OrchestratorConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = OrchestratorConfig::from_env().map_err(anyhow::Error::msg)?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(config.log_level.clone()))
        .init();

    let store = SessionStore::new(SessionStoreConfig {
        durable_base_path: config.session_store_base_path.clone(),
        cache_ttl: config.cache_ttl,
    });
    let registry = AgentRegistry::new();
    let host = config.host.clone();
    let port = config.port;
    let state = AppState::new(store, registry, config);

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!(%host, %port, "orchestrator listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    let client_routes = Router::new()
        .route("/sessions/initialize", post(rest::initialize))
        .route("/sessions/{id}/status", get(rest::status))
        .route("/sessions/{id}/clarify", post(rest::clarify))
        .route("/sessions/{id}/result", get(rest::result))
        .route("/health", get(rest::health));

    let internal_routes = Router::new()
        .route("/internal/register_agent", post(internal::register_agent))
        .route("/internal/agents", get(internal::list_agents))
        .route(
            "/internal/sessions/{id}/context",
            get(internal::get_context).patch(internal::patch_context),
        )
        .route("/internal/route_message", post(internal::route_message));

    Router::new()
        .nest("/api/v1", client_routes)
        .merge(internal_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
