//! Vector store abstraction and the JSON-file backed implementation.
//!
//! A collection is a directory `{base}/{collection}` containing
//! `meta.json` (collection metadata) and `chunks.json` (stored chunks
//! with their embeddings). Existence of that directory is the signal the
//! ingestion gate relies on. The store owns its embedder: `add_documents`
//! computes embeddings for incoming chunks and `search` embeds the query
//! before ranking by cosine similarity.
//!
//! The persisted layout assumes a single writer and a single reader; no
//! cross-process locking is attempted.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::rag::embeddings::Embedder;
use crate::types::{AppError, Document, DocumentMetadata, Result, SearchResult};

/// Default number of results returned by a similarity search.
pub const DEFAULT_TOP_K: usize = 4;

/// Abstract vector store: add chunks, search by query text.
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Whether the named collection already exists on disk.
    async fn exists(&self, collection: &str) -> Result<bool>;

    /// Embed and persist chunks into a collection, creating it if
    /// needed. Returns the number of chunks stored.
    async fn add_documents(&self, collection: &str, documents: &[Document]) -> Result<usize>;

    /// Embed `query` and return the `top_k` most similar chunks,
    /// best first.
    async fn search(&self, collection: &str, query: &str, top_k: usize) -> Result<Vec<SearchResult>>;

    /// Remove a collection and all its data. Removing a missing
    /// collection is a no-op.
    async fn delete_collection(&self, collection: &str) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct CollectionMeta {
    name: String,
    dimensions: usize,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredChunk {
    id: String,
    content: String,
    metadata: DocumentMetadata,
    embedding: Vec<f32>,
}

/// File-backed vector store: one directory per collection, JSON files
/// inside. Loaded collections are cached in memory for repeated
/// searches within a process.
pub struct JsonVectorStore {
    base: PathBuf,
    embedder: Arc<dyn Embedder>,
    cache: RwLock<HashMap<String, Arc<Vec<StoredChunk>>>>,
}

impl JsonVectorStore {
    pub fn new(base: impl Into<PathBuf>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            base: base.into(),
            embedder,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.base.join(collection)
    }

    async fn load_chunks(&self, collection: &str) -> Result<Arc<Vec<StoredChunk>>> {
        if let Some(chunks) = self.cache.read().get(collection) {
            return Ok(chunks.clone());
        }

        let path = self.collection_path(collection).join("chunks.json");
        if !path.exists() {
            return Err(AppError::NotFound(format!(
                "Collection '{}' does not exist under {}",
                collection,
                self.base.display()
            )));
        }

        let raw = tokio::fs::read_to_string(&path).await?;
        let chunks: Vec<StoredChunk> = serde_json::from_str(&raw)
            .map_err(|e| AppError::Store(format!("Failed to parse {}: {}", path.display(), e)))?;

        let chunks = Arc::new(chunks);
        self.cache
            .write()
            .insert(collection.to_string(), chunks.clone());
        Ok(chunks)
    }

    async fn persist(&self, collection: &str, chunks: &[StoredChunk]) -> Result<()> {
        let dir = self.collection_path(collection);
        tokio::fs::create_dir_all(&dir).await?;

        let dimensions = chunks.first().map(|c| c.embedding.len()).unwrap_or(0);
        let meta = CollectionMeta {
            name: collection.to_string(),
            dimensions,
            created_at: Utc::now(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| AppError::Store(format!("Failed to serialize metadata: {}", e)))?;
        tokio::fs::write(dir.join("meta.json"), meta_json).await?;

        let chunks_json = serde_json::to_string(chunks)
            .map_err(|e| AppError::Store(format!("Failed to serialize chunks: {}", e)))?;
        tokio::fs::write(dir.join("chunks.json"), chunks_json).await?;

        Ok(())
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for JsonVectorStore {
    fn provider_name(&self) -> &'static str {
        "json-file"
    }

    async fn exists(&self, collection: &str) -> Result<bool> {
        Ok(self.collection_path(collection).exists())
    }

    async fn add_documents(&self, collection: &str, documents: &[Document]) -> Result<usize> {
        if documents.is_empty() {
            warn!(collection, "no documents passed in to vector store");
        }

        let mut chunks = match self.load_chunks(collection).await {
            Ok(existing) => existing.as_ref().clone(),
            Err(AppError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != documents.len() {
            return Err(AppError::Embedding(format!(
                "Embedder returned {} vectors for {} documents",
                embeddings.len(),
                documents.len()
            )));
        }

        for (doc, embedding) in documents.iter().zip(embeddings) {
            chunks.push(StoredChunk {
                id: doc.id.clone(),
                content: doc.content.clone(),
                metadata: doc.metadata.clone(),
                embedding,
            });
        }

        self.persist(collection, &chunks).await?;
        let count = chunks.len();
        self.cache
            .write()
            .insert(collection.to_string(), Arc::new(chunks));

        info!(collection, added = documents.len(), total = count, "stored documents");
        Ok(documents.len())
    }

    async fn search(&self, collection: &str, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let chunks = self.load_chunks(collection).await?;
        let query_embedding = self.embedder.embed_query(query).await?;

        let mut results: Vec<SearchResult> = chunks
            .iter()
            .map(|chunk| SearchResult {
                score: Self::cosine_similarity(&query_embedding, &chunk.embedding),
                document: Document {
                    id: chunk.id.clone(),
                    content: chunk.content.clone(),
                    metadata: chunk.metadata.clone(),
                },
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);
        Ok(results)
    }

    async fn delete_collection(&self, collection: &str) -> Result<()> {
        let dir = self.collection_path(collection);
        if dir.exists() {
            tokio::fs::remove_dir_all(&dir).await?;
        }
        self.cache.write().remove(collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::HashEmbedder;

    fn make_doc(content: &str) -> Document {
        Document::new(content, DocumentMetadata::from_source("test"))
    }

    fn make_store(dir: &std::path::Path) -> JsonVectorStore {
        JsonVectorStore::new(dir.join("store"), Arc::new(HashEmbedder::new(64)))
    }

    #[tokio::test]
    async fn add_then_search_returns_most_similar_first() {
        let tmp = tempfile::tempdir().unwrap();
        let store = make_store(tmp.path());

        let docs = vec![
            make_doc("rust is a systems programming language"),
            make_doc("cats enjoy sleeping in warm places"),
            make_doc("the rust borrow checker prevents data races"),
        ];
        store.add_documents("docs", &docs).await.unwrap();

        let results = store
            .search("docs", "rust programming language", DEFAULT_TOP_K)
            .await
            .unwrap();
        assert!(!results.is_empty());
        assert!(results[0].document.content.contains("rust"));
        assert!(results[0].score >= results[results.len() - 1].score);
    }

    #[tokio::test]
    async fn collections_persist_across_store_instances() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = make_store(tmp.path());
            store
                .add_documents("books", &[make_doc("sing in me muse")])
                .await
                .unwrap();
        }

        let reopened = make_store(tmp.path());
        assert!(reopened.exists("books").await.unwrap());
        let results = reopened.search("books", "muse", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.content, "sing in me muse");
    }

    #[tokio::test]
    async fn search_missing_collection_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = make_store(tmp.path());
        let err = store.search("nope", "query", 3).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_collection_removes_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = make_store(tmp.path());
        store
            .add_documents("gone", &[make_doc("ephemeral")])
            .await
            .unwrap();
        assert!(store.exists("gone").await.unwrap());

        store.delete_collection("gone").await.unwrap();
        assert!(!store.exists("gone").await.unwrap());

        // Deleting again is a no-op
        store.delete_collection("gone").await.unwrap();
    }

    #[tokio::test]
    async fn short_embedding_batch_fails_without_persisting() {
        struct ShortEmbedder;

        #[async_trait]
        impl Embedder for ShortEmbedder {
            async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
                Ok(texts.iter().skip(1).map(|_| vec![0.0]).collect())
            }

            async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
                Ok(vec![0.0])
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        let store = JsonVectorStore::new(tmp.path().join("store"), Arc::new(ShortEmbedder));

        let err = store
            .add_documents("col", &[make_doc("first"), make_doc("second")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
        assert!(err.to_string().contains("1 vectors for 2 documents"));
        assert!(!store.exists("col").await.unwrap());
    }

    #[tokio::test]
    async fn top_k_limits_result_count() {
        let tmp = tempfile::tempdir().unwrap();
        let store = make_store(tmp.path());
        let docs: Vec<Document> = (0..10)
            .map(|i| make_doc(&format!("shared words plus unique{}", i)))
            .collect();
        store.add_documents("many", &docs).await.unwrap();

        let results = store.search("many", "shared words", 3).await.unwrap();
        assert_eq!(results.len(), 3);
    }
}
