//! LLM provider trait.
//!
//! Defines the interface that all LLM providers must implement.

use async_trait::async_trait;

use crate::error::LlmResult;
use crate::types::{LlmResponse, Message};

/// LLM provider trait.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Get the model being used.
    fn model(&self) -> &str;

    /// Complete a conversation.
    ///
    /// Returns the full response once generation is complete.
    async fn complete(&self, messages: &[Message], system: &str) -> LlmResult<LlmResponse>;

    /// Simple text completion.
    async fn complete_simple(&self, prompt: &str) -> LlmResult<String> {
        let messages = vec![Message::user(prompt)];
        let response = self.complete(&messages, "").await?;
        Ok(response.message.content)
    }

    /// Count tokens in text (approximate).
    fn count_tokens(&self, text: &str) -> usize {
        // Rough approximation: ~4 chars per token
        text.len() / 4
    }

    /// Get maximum context length.
    fn max_context_length(&self) -> usize;
}

/// Lets `Box<dyn LlmProvider>` stand in wherever `P: LlmProvider` is
/// required, e.g. `RecordingProvider<Box<dyn LlmProvider>>`.
#[async_trait]
impl LlmProvider for Box<dyn LlmProvider> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    async fn complete(&self, messages: &[Message], system: &str) -> LlmResult<LlmResponse> {
        (**self).complete(messages, system).await
    }

    fn count_tokens(&self, text: &str) -> usize {
        (**self).count_tokens(text)
    }

    fn max_context_length(&self) -> usize {
        (**self).max_context_length()
    }
}
