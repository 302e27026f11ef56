//! Shared doubles for integration tests.

use async_trait::async_trait;
use parking_lot::Mutex;

use quarry::llm::ChatModel;
use quarry::rag::Embedder;
use quarry::{Message, Result};

/// Deterministic embedder: token-hash bag-of-words vectors, so texts
/// sharing words score high under cosine similarity.
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        for token in text.to_lowercase().split_whitespace() {
            let mut h: u64 = 1469598103934665603;
            for b in token.bytes() {
                h ^= b as u64;
                h = h.wrapping_mul(1099511628211);
            }
            v[(h % self.dims as u64) as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_one(text))
    }
}

/// Chat model that echoes the system prompt and the last user message,
/// so assertions can see exactly what the chain sent.
pub struct EchoModel {
    pub calls: Mutex<Vec<(String, Vec<Message>)>>,
}

impl EchoModel {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatModel for EchoModel {
    async fn complete(&self, system: &str, messages: &[Message]) -> Result<String> {
        self.calls.lock().push((system.to_string(), messages.to_vec()));
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        Ok(format!("echo: {}", last))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}
