//! One-shot ingestion pipeline: load a text file, chunk it, embed the
//! chunks and persist them into a vector store collection.
//!
//! Initialization is gated on collection existence: if the collection
//! directory is already present the pipeline does nothing and reports
//! [`IngestOutcome::AlreadyInitialized`]. The gate never diffs content,
//! so re-running after the source file changed still skips the work;
//! delete the collection to force a rebuild.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::db::VectorStore;
use crate::loader::TextLoader;
use crate::rag::chunker::Chunker;
use crate::types::{AppError, Document, Result};

#[derive(Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The collection already existed; nothing was loaded or embedded.
    AlreadyInitialized,
    /// The collection was created with this many chunks.
    Created { chunks: usize },
}

pub struct IngestPipeline {
    store: Arc<dyn VectorStore>,
    chunker: Box<dyn Chunker>,
}

impl IngestPipeline {
    pub fn new(store: Arc<dyn VectorStore>, chunker: Box<dyn Chunker>) -> Self {
        Self { store, chunker }
    }

    /// Run the pipeline for one source file into one collection.
    ///
    /// The existence check happens before the source file is touched, so
    /// a missing source only fails on a first run.
    pub async fn run(&self, source: &Path, collection: &str) -> Result<IngestOutcome> {
        if self.store.exists(collection).await? {
            info!(collection, "vector store already exists, skipping ingestion");
            return Ok(IngestOutcome::AlreadyInitialized);
        }

        if !source.exists() {
            return Err(AppError::NotFound(format!(
                "Source file {} does not exist",
                source.display()
            )));
        }

        let document = TextLoader::load(source)?;
        let chunks = self.chunker.chunk(&document.content);
        info!(collection, chunks = chunks.len(), "chunked source document");

        let documents: Vec<Document> = chunks
            .into_iter()
            .map(|content| Document::new(content, document.metadata.clone()))
            .collect();

        self.store.add_documents(collection, &documents).await?;
        Ok(IngestOutcome::Created {
            chunks: documents.len(),
        })
    }
}
