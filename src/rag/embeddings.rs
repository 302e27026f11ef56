//! Embedding providers.
//!
//! The [`Embedder`] trait abstracts over "embed a batch of texts" and
//! "embed a single query". [`OpenAiEmbedder`] talks to the OpenAI
//! embeddings endpoint; [`RateLimitedEmbedder`] wraps any embedder and
//! pauses a fixed delay before every delegated call to stay under an
//! external rate limit. Errors from the underlying embedder propagate
//! unchanged; no retry is performed anywhere in this module.

use std::sync::Arc;
use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::embeddings::CreateEmbeddingRequestArgs,
    Client,
};
use async_trait::async_trait;
use tracing::debug;

use crate::types::{AppError, Result};

/// An embedding capability: texts in, fixed-length float vectors out.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts. Output order matches input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;
}

/// OpenAI embeddings client.
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str, model: &str) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(texts.to_vec())
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| AppError::Embedding(format!("OpenAI API error: {}", e)))?;

        debug!(count = response.data.len(), model = %self.model, "embedded batch");

        Ok(response.data.into_iter().map(|e| e.embedding).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(text)
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| AppError::Embedding(format!("OpenAI API error: {}", e)))?;

        response
            .data
            .into_iter()
            .next()
            .map(|e| e.embedding)
            .ok_or_else(|| AppError::Embedding("No embedding in response".to_string()))
    }
}

/// Rate-limiting proxy around an [`Embedder`].
///
/// Sleeps for the configured delay before every call, unconditionally.
/// The delay does not adapt to observed throttling responses.
pub struct RateLimitedEmbedder {
    inner: Arc<dyn Embedder>,
    delay: Duration,
}

impl RateLimitedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl Embedder for RateLimitedEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        tokio::time::sleep(self.delay).await;
        self.inner.embed_batch(texts).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        tokio::time::sleep(self.delay).await;
        self.inner.embed_query(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Instant;

    struct RecordingEmbedder {
        calls: Mutex<Vec<Instant>>,
    }

    impl RecordingEmbedder {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Embedder for RecordingEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.lock().push(Instant::now());
            Ok(texts.iter().map(|_| vec![0.0]).collect())
        }

        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
            self.calls.lock().push(Instant::now());
            Ok(vec![0.0])
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(AppError::Embedding("upstream down".into()))
        }

        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
            Err(AppError::Embedding("upstream down".into()))
        }
    }

    #[tokio::test]
    async fn proxy_spaces_calls_by_at_least_the_delay() {
        let inner = Arc::new(RecordingEmbedder::new());
        let proxy = RateLimitedEmbedder::new(inner.clone(), Duration::from_millis(20));

        let start = Instant::now();
        for i in 0..4 {
            proxy.embed_query(&format!("q{}", i)).await.unwrap();
        }

        let calls = inner.calls.lock();
        assert_eq!(calls.len(), 4);
        for (i, call) in calls.iter().enumerate() {
            let min_elapsed = Duration::from_millis(20) * (i as u32 + 1);
            assert!(
                call.duration_since(start) >= min_elapsed,
                "call {} arrived after {:?}, expected at least {:?}",
                i,
                call.duration_since(start),
                min_elapsed
            );
        }
    }

    #[tokio::test]
    async fn proxy_applies_delay_to_batch_calls_too() {
        let inner = Arc::new(RecordingEmbedder::new());
        let proxy = RateLimitedEmbedder::new(inner.clone(), Duration::from_millis(20));

        let start = Instant::now();
        proxy.embed_batch(&["a".to_string(), "b".to_string()]).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert_eq!(inner.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn proxy_propagates_errors_unchanged() {
        let proxy = RateLimitedEmbedder::new(Arc::new(FailingEmbedder), Duration::from_millis(1));
        let err = proxy.embed_query("q").await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
        assert!(err.to_string().contains("upstream down"));
    }
}
