//! Retrieval-augmented generation building blocks: chunking, embedding,
//! lexical and vector retrieval, and the ingestion pipeline that feeds
//! the vector store.

pub mod chunker;
pub mod embeddings;
pub mod ingest;
pub mod retriever;
pub mod search;

pub use chunker::{CharacterChunker, Chunker, RecursiveCharacterChunker};
pub use embeddings::{Embedder, OpenAiEmbedder, RateLimitedEmbedder};
pub use ingest::{IngestOutcome, IngestPipeline};
pub use retriever::{Bm25Retriever, EnsembleRetriever, Retriever, VectorRetriever};
pub use search::{Bm25Index, RrfFusion};
