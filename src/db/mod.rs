//! Persistence layer.

pub mod vectorstore;

pub use vectorstore::{JsonVectorStore, VectorStore, DEFAULT_TOP_K};
