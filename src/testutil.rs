//! Shared test doubles for unit tests.

use async_trait::async_trait;

use crate::rag::embeddings::Embedder;
use crate::types::Result;

/// Deterministic embedder: token-hash bag-of-words vectors, so texts
/// sharing words land close together under cosine similarity.
pub(crate) struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub(crate) fn new(dims: usize) -> Self {
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
