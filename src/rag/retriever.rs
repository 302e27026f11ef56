//! Retrievers: turn a query into a ranked list of documents.
//!
//! [`VectorRetriever`] and [`Bm25Retriever`] each produce a ranked list
//! from their own index; [`EnsembleRetriever`] runs any number of
//! members and merges their lists with weighted reciprocal-rank fusion.
//! A document surfaced by several members is counted once in the fused
//! output, identified by its id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::db::VectorStore;
use crate::rag::search::{Bm25Index, RrfFusion};
use crate::types::{Document, Result};

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `top_k` documents relevant to `query`, best first.
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>>;
}

/// Similarity search against a vector store collection.
pub struct VectorRetriever {
    store: Arc<dyn VectorStore>,
    collection: String,
    top_k: usize,
}

impl VectorRetriever {
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>, top_k: usize) -> Self {
        Self {
            store,
            collection: collection.into(),
            top_k,
        }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        let results = self.store.search(&self.collection, query, self.top_k).await?;
        Ok(results.into_iter().map(|r| r.document).collect())
    }
}

/// Keyword search over an in-memory BM25 index.
///
/// The index holds only ids and term statistics, so the retriever keeps
/// a side map from id to the full document.
pub struct Bm25Retriever {
    index: Bm25Index,
    documents: HashMap<String, Document>,
    top_k: usize,
}

impl Bm25Retriever {
    pub fn new(documents: Vec<Document>, top_k: usize) -> Self {
        let mut index = Bm25Index::new();
        let mut by_id = HashMap::with_capacity(documents.len());
        for doc in documents {
            index.add_document(&doc.id, &doc.content);
            by_id.insert(doc.id.clone(), doc);
        }
        Self {
            index,
            documents: by_id,
            top_k,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[async_trait]
impl Retriever for Bm25Retriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        let ranked = self.index.search(query, self.top_k);
        Ok(ranked
            .into_iter()
            .filter_map(|(id, _)| self.documents.get(&id).cloned())
            .collect())
    }
}

/// Weighted ensemble over several retrievers.
///
/// Member lists are fused by rank, not by score; a member failure fails
/// the whole retrieval.
pub struct EnsembleRetriever {
    members: Vec<(Arc<dyn Retriever>, f32)>,
    fusion: RrfFusion,
    top_k: usize,
}

impl EnsembleRetriever {
    pub fn new(members: Vec<(Arc<dyn Retriever>, f32)>, top_k: usize) -> Self {
        Self {
            members,
            fusion: RrfFusion::new(),
            top_k,
        }
    }
}

#[async_trait]
impl Retriever for EnsembleRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        let mut ranked_lists: Vec<(Vec<(String, f32)>, f32)> = Vec::new();
        let mut by_id: HashMap<String, Document> = HashMap::new();

        for (member, weight) in &self.members {
            let docs = member.retrieve(query).await?;
            let list: Vec<(String, f32)> = docs
                .iter()
                .enumerate()
                .map(|(rank, doc)| (doc.id.clone(), rank as f32))
                .collect();
            for doc in docs {
                by_id.entry(doc.id.clone()).or_insert(doc);
            }
            ranked_lists.push((list, *weight));
        }

        let borrowed: Vec<(&[(String, f32)], f32)> = ranked_lists
            .iter()
            .map(|(list, weight)| (list.as_slice(), *weight))
            .collect();
        let fused = self.fusion.fuse(&borrowed);

        debug!(candidates = fused.len(), top_k = self.top_k, "fused retrieval lists");

        Ok(fused
            .into_iter()
            .take(self.top_k)
            .filter_map(|(id, _)| by_id.remove(&id))
            .collect())
    }
}
