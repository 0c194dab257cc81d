//! Completion Provider Trait
//!
//! Defines the common interface for all completion-service backends.

use async_trait::async_trait;

use super::types::{LlmRequestOptions, LlmResponse, LlmResult, Message, ToolDefinition};

/// Trait that all completion-service backends must implement.
///
/// No ordering guarantee exists between calls; every call is an independent
/// suspension point for the cooperative scheduler.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Send a message sequence and get a complete response.
    ///
    /// # Arguments
    /// * `messages` - Conversation history
    /// * `system` - Optional system instruction
    /// * `tools` - Tools surfaced to the model
    /// * `options` - Per-request overrides
    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
        options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse>;

    /// Check if the provider is healthy and reachable.
    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }
}
