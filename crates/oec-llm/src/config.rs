//! Per-agent LLM configuration (spec §4.5, §6.5: "per-agent LLM parameters").
//!
//! Every agent pins exactly one provider for its lifetime at startup — there
//! is no runtime provider switching. Different agents run different
//! settings from the same struct (e.g. the Conversion agent's low-temperature
//! error-explanation call vs. the Conversation agent's extraction call).

use std::time::Duration;

/// Which family of provider a pinned [`LlmConfig`] talks to (spec §4.5:
/// "both cloud ... and local ... must be supportable; the agent pins one
/// provider for its lifetime").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// A remote-service API reached with a bearer credential.
    Cloud,
    /// An HTTP endpoint on the local network, no credential required.
    Local,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cloud" => Ok(ProviderKind::Cloud),
            "local" => Ok(ProviderKind::Local),
            other => Err(format!("unknown LLM provider kind: {other}")),
        }
    }
}

/// Fully resolved configuration for one agent's `call_llm` wrapper.
/// Constructed once at process startup from environment variables (spec
/// §6.5) — no config-file parsing, mirroring the teacher's explicit
/// `CloudLLMConfig` over a global settings singleton (spec §9).
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    pub base_url: String,
    pub model: String,
    /// Bearer credential for [`ProviderKind::Cloud`]; unused for `Local`.
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub request_timeout: Duration,
    /// Retry ceiling per spec §4.5: "up to 5 attempts total" for both the
    /// rate-limit and generic-transient branches.
    pub max_retries: u32,
}

impl LlmConfig {
    /// Read `{prefix}_LLM_PROVIDER`, `{prefix}_LLM_BASE_URL`, etc. from the
    /// environment, applying spec-mandated defaults where sensible. `prefix`
    /// is the agent name in SCREAMING_SNAKE_CASE, e.g. `CONVERSATION`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let var = |suffix: &str| std::env::var(format!("{prefix}_{suffix}"));

        let provider: ProviderKind = var("LLM_PROVIDER")
            .unwrap_or_else(|_| "cloud".to_string())
            .parse()?;

        let base_url = var("LLM_BASE_URL").map_err(|_| {
            format!("{prefix}_LLM_BASE_URL is required (cloud API base or local endpoint)")
        })?;

        let model = var("LLM_MODEL").unwrap_or_else(|_| "default".to_string());

        let api_key = var("LLM_API_KEY").ok();
        if provider == ProviderKind::Cloud && api_key.is_none() {
            return Err(format!(
                "{prefix}_LLM_API_KEY is required when {prefix}_LLM_PROVIDER=cloud"
            ));
        }

        let temperature = parse_env_or(&var("LLM_TEMPERATURE"), 0.7)?;
        let max_tokens = parse_env_or(&var("LLM_MAX_TOKENS"), 1024)?;
        let top_p = parse_env_or(&var("LLM_TOP_P"), 1.0)?;
        let timeout_secs: u64 = parse_env_or(&var("LLM_REQUEST_TIMEOUT_SECS"), 60)?;
        let max_retries = parse_env_or(&var("LLM_MAX_RETRIES"), 5)?;

        Ok(Self {
            provider,
            base_url,
            model,
            api_key,
            temperature,
            max_tokens,
            top_p,
            request_timeout: Duration::from_secs(timeout_secs),
            max_retries,
        })
    }
}

fn parse_env_or<T: std::str::FromStr>(raw: &Result<String, std::env::VarError>, default: T) -> Result<T, String> {
    match raw {
        Ok(s) => s.parse().map_err(|_| format!("invalid numeric value: {s}")),
        Err(_) => Ok(default),
    }
}
