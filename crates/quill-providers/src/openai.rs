//! OpenAI-compatible chat-completions provider.
//!
//! Works with OpenAI's API and any compatible endpoint.
//! Exports `pub(crate)` helpers reused by the DeepSeek provider.

use async_trait::async_trait;
use quill_core::{
    context::Context,
    error::QuillError,
    message::{Reply, ReplyMetadata, Turn},
    traits::Provider,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// OpenAI-compatible provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    /// Create from config values.
    pub fn from_config(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, QuillError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url,
            api_key,
            model,
        })
    }
}

/// Build an HTTP client with a whole-request timeout.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, QuillError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| QuillError::Provider(format!("failed to build http client: {e}")))
}

/// Build OpenAI-format messages from context (system as a message role).
pub(crate) fn build_openai_messages(system: &str, turns: &[Turn]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(turns.len() + 1);
    if !system.is_empty() {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system.to_string(),
        });
    }
    for turn in turns {
        messages.push(ChatMessage {
            role: turn.role().as_str().to_string(),
            content: turn.content().to_string(),
        });
    }
    messages
}

#[derive(Serialize, Deserialize, Clone)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Option<Vec<ChatChoice>>,
    pub model: Option<String>,
    pub usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ChatMessage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatUsage {
    pub total_tokens: Option<u64>,
}

/// Run one chat-completion round trip.
///
/// `name` is the provider name used in log lines, errors and metadata.
pub(crate) async fn chat_complete(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    default_model: &str,
    context: &Context,
    name: &str,
) -> Result<Reply, QuillError> {
    let effective_model = context.model.as_deref().unwrap_or(default_model);
    let start = Instant::now();

    let body = ChatCompletionRequest {
        model: effective_model.to_string(),
        messages: build_openai_messages(&context.system_prompt, &context.turns),
    };

    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    debug!(
        "{name}: POST {url} model={effective_model} turns={}",
        context.turns.len()
    );

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&body)
        .send()
        .await
        .map_err(|e| QuillError::Provider(format!("{name} request failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        return Err(QuillError::Provider(format!(
            "{name} returned {status}: {text}"
        )));
    }

    let parsed: ChatCompletionResponse = resp
        .json()
        .await
        .map_err(|e| QuillError::Provider(format!("{name}: failed to parse response: {e}")))?;

    let text = first_choice_text(&parsed)
        .ok_or_else(|| QuillError::Provider(format!("no response from {name}")))?;

    Ok(Reply {
        text,
        metadata: ReplyMetadata {
            provider_used: name.to_string(),
            tokens_used: parsed.usage.as_ref().and_then(|u| u.total_tokens),
            processing_time_ms: start.elapsed().as_millis() as u64,
            model: parsed.model,
        },
    })
}

/// Content of the first choice, if the service returned one.
pub(crate) fn first_choice_text(resp: &ChatCompletionResponse) -> Option<String> {
    resp.choices
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|c| c.message.as_ref())
        .map(|m| m.content.clone())
}

/// `GET {base_url}/models` as a cheap credential check.
pub(crate) async fn models_reachable(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    name: &str,
) -> bool {
    if api_key.is_empty() {
        warn!("{name}: no API key configured");
        return false;
    }
    let url = format!("{}/models", base_url.trim_end_matches('/'));
    match client
        .get(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .send()
        .await
    {
        Ok(resp) => resp.status().is_success(),
        Err(e) => {
            warn!("{name} not available: {e}");
            false
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    async fn complete(&self, context: &Context) -> Result<Reply, QuillError> {
        chat_complete(
            &self.client,
            &self.base_url,
            &self.api_key,
            &self.model,
            context,
            self.name(),
        )
        .await
    }

    async fn is_available(&self) -> bool {
        models_reachable(&self.client, &self.base_url, &self.api_key, self.name()).await
    }
}
