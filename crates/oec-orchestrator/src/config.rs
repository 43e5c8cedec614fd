//! Orchestrator process configuration (spec §6.5 "Server" group).

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub host: String,
    pub port: u16,
    pub cache_ttl: Duration,
    pub session_store_base_path: PathBuf,
    pub output_dir: PathBuf,
    pub log_level: String,
    /// Shared secret every agent presents on internal calls (SPEC_FULL §3
    /// bearer-auth supplement; see DESIGN.md for why a single shared secret
    /// was chosen over one token per agent).
    pub bearer_token: String,
}

impl OrchestratorConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = std::env::var("ORCHESTRATOR_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("ORCHESTRATOR_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| "ORCHESTRATOR_PORT must be a valid port number".to_string())?;

        let cache_ttl_secs: u64 = std::env::var("ORCHESTRATOR_CACHE_TTL_SECONDS")
            .ok()
            .map(|v| v.parse())
            .transpose()
            .map_err(|_| "ORCHESTRATOR_CACHE_TTL_SECONDS must be a number".to_string())?
            .unwrap_or(oec_store::DEFAULT_TTL_SECONDS);

        let session_store_base_path = std::env::var("SESSION_STORE_BASE_PATH")
            .unwrap_or_else(|_| "session_store".to_string())
            .into();

        let output_dir = std::env::var("OUTPUT_DIR")
            .unwrap_or_else(|_| "output".to_string())
            .into();

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let bearer_token = std::env::var("ORCHESTRATOR_BEARER_TOKEN")
            .map_err(|_| "ORCHESTRATOR_BEARER_TOKEN is required".to_string())?;

        Ok(Self {
            host,
            port,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            session_store_base_path,
            output_dir,
            log_level,
            bearer_token,
        })
    }
}
