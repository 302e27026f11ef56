//! Chat-completion providers.

pub mod openai;

use async_trait::async_trait;

use crate::types::{Message, Result};

/// A chat-completion capability: system prompt plus conversation in,
/// assistant reply out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, messages: &[Message]) -> Result<String>;

    fn model_name(&self) -> &str;
}

pub use openai::OpenAiChat;
