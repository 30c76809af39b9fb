use crate::{context::Context, error::QuillError, message::Reply};
use async_trait::async_trait;

/// Completion service trait.
///
/// Every chat-completion backend (DeepSeek, OpenAI-compatible endpoints, etc.)
/// implements this trait. The transcript engine only ever sees this interface.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Whether this provider requires an API key to function.
    fn requires_api_key(&self) -> bool;

    /// Send the assembled context window and get a single reply.
    async fn complete(&self, context: &Context) -> Result<Reply, QuillError>;

    /// Check if the provider is reachable and accepts our credentials.
    async fn is_available(&self) -> bool;
}
