//! DeepSeek chat provider.
//!
//! Reuses the OpenAI-compatible request/response types.
//! Only the default endpoint, model and provider name differ.

use async_trait::async_trait;
use quill_core::{context::Context, error::QuillError, message::Reply, traits::Provider};
use std::time::Duration;

use crate::openai::{build_client, chat_complete, models_reachable};

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEEPSEEK_DEFAULT_MODEL: &str = "deepseek-chat";

/// DeepSeek provider.
pub struct DeepSeekProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl DeepSeekProvider {
    /// Create from config values. Empty `base_url`/`model` fall back to DeepSeek's defaults.
    pub fn from_config(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, QuillError> {
        let base_url = if base_url.is_empty() {
            DEEPSEEK_BASE_URL.to_string()
        } else {
            base_url
        };
        let model = if model.is_empty() {
            DEEPSEEK_DEFAULT_MODEL.to_string()
        } else {
            model
        };
        Ok(Self {
            client: build_client(timeout)?,
            base_url,
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Provider for DeepSeekProvider {
    fn name(&self) -> &str {
        "deepseek"
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
