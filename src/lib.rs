//! Quarry — retrieval-augmented question answering over local files.
//!
//! Two pipelines share the building blocks in this crate:
//!
//! - **Ingestion**: load a text file, chunk it, embed the chunks through
//!   a rate-limited proxy, and persist them into a file-backed vector
//!   store. Idempotent: an existing collection short-circuits the run.
//! - **QA chat**: discover CSV files, load one document per record,
//!   retrieve with a BM25 + vector-similarity ensemble fused by
//!   reciprocal rank, and answer through a conversational chain that
//!   reformulates follow-up questions against the session history.

pub mod chain;
pub mod cli;
pub mod config;
pub mod db;
pub mod llm;
pub mod loader;
pub mod rag;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::Config;
pub use types::{AppError, Document, DocumentMetadata, Message, MessageRole, Result, SearchResult};
