//! Provider-agnostic chat-completion client (spec §4.5: "a single
//! `call_llm(prompt, system_message?)` abstraction").
//!
//! Grounded on the teacher's [`ClientWrapper`](cloudllm::client_wrapper::ClientWrapper)
//! trait-per-provider shape, collapsed to the one capability this system
//! actually needs — "generate completion given prompt + system message"
//! (spec §1, out-of-scope list) — rather than the teacher's full streaming
//! and tool-calling surface, which this system never exercises.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{LlmConfig, ProviderKind};
use crate::errors::{LlmCallError, LlmErrorKind};

/// One resolved completion, stripped of provider-specific framing.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
}

/// Implemented once per [`ProviderKind`]. [`crate::retry::call_llm`] is the
/// only caller; it owns the retry/backoff policy so implementations only
/// need to classify the failures they encounter.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        system_message: Option<&str>,
    ) -> Result<Completion, LlmCallError>;
}

/// OpenAI-compatible chat-completions wire format, used by both provider
/// kinds below — cloud providers and most local inference servers
/// (llama.cpp, Ollama, vLLM) speak this shape at `/chat/completions` or a
/// path with a compatible `/v1` prefix.
#[derive(serde::Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Deserialize)]
struct ChatCompletionMessage {
    content: String,
}

/// Shared request/response plumbing for both provider kinds; only the base
/// URL and the presence of a bearer credential differ (spec §4.5: "Provider
/// is selected from config at agent startup").
pub struct HttpLlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn classify_status(status: reqwest::StatusCode) -> LlmErrorKind {
        if status.as_u16() == 429 {
            LlmErrorKind::RateLimited
        } else if status.is_client_error() {
            LlmErrorKind::MalformedInput
        } else {
            LlmErrorKind::Transient
        }
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(
        &self,
        prompt: &str,
        system_message: Option<&str>,
    ) -> Result<Completion, LlmCallError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_message {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            top_p: self.config.top_p,
        };

        let mut request = self.http.post(self.endpoint()).json(&body);
        if self.config.provider == ProviderKind::Cloud {
            let key = self.config.api_key.as_deref().ok_or_else(|| {
                LlmCallError::new(LlmErrorKind::Configuration, "cloud provider missing api_key")
            })?;
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmCallError::transient(format!("request timed out: {e}"))
            } else if e.is_connect() {
                LlmCallError::transient(format!("connection failed: {e}"))
            } else {
                LlmCallError::new(LlmErrorKind::Configuration, format!("request build failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let kind = Self::classify_status(status);
            let body_text = response.text().await.unwrap_or_default();
            return Err(LlmCallError::new(
                kind,
                format!("provider returned {status}: {body_text}"),
            ));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            LlmCallError::transient(format!("failed to decode provider response: {e}"))
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                LlmCallError::new(LlmErrorKind::Transient, "provider returned zero choices")
            })?;

        Ok(Completion { text })
    }
}
