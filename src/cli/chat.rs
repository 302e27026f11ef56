//! Interactive question-answering session.
//!
//! Assembles the QA pipeline (CSV corpus -> chunks -> hybrid retriever
//! -> conversational chain) and runs a terminal read-eval loop on top of
//! it. The vector store collection is rebuilt from the corpus on every
//! launch so edited CSV files are picked up and records are never
//! appended twice.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use crate::chain::{ChainInput, MemoryChain, RagChain};
use crate::cli::output::Output;
use crate::config::Config;
use crate::db::{JsonVectorStore, VectorStore};
use crate::llm::{ChatModel, OpenAiChat};
use crate::loader::load_csv_dir;
use crate::rag::{
    Bm25Retriever, Chunker, Embedder, EnsembleRetriever, OpenAiEmbedder, RateLimitedEmbedder,
    RecursiveCharacterChunker, Retriever, VectorRetriever,
};
use crate::types::{Document, Result};

/// Weight given to each of the two retrievers in the hybrid ensemble.
const ENSEMBLE_WEIGHT: f32 = 0.5;

pub struct ChatArgs {
    pub collection: String,
    pub top_k: usize,
}

/// Split each loaded record with the recursive chunker, keeping the
/// record's metadata on every chunk.
fn chunk_documents(documents: &[Document], chunker: &dyn Chunker) -> Vec<Document> {
    let mut out = Vec::new();
    for document in documents {
        for piece in chunker.chunk(&document.content) {
            out.push(Document::new(piece, document.metadata.clone()));
        }
    }
    out
}

/// Build the hybrid retriever over the CSV corpus in `data_dir`.
async fn build_retriever(
    config: &Config,
    args: &ChatArgs,
    data_dir: &Path,
) -> Result<Arc<dyn Retriever>> {
    let records = load_csv_dir(data_dir)?;
    let chunker = RecursiveCharacterChunker::new(config.chunk_size);
    let chunks = chunk_documents(&records, &chunker);
    info!(records = records.len(), chunks = chunks.len(), "prepared QA corpus");

    let embedder: Arc<dyn Embedder> = Arc::new(RateLimitedEmbedder::new(
        Arc::new(OpenAiEmbedder::new(
            &config.openai_api_key,
            &config.embedding_model,
        )),
        Duration::from_millis(config.embed_delay_ms),
    ));
    let store: Arc<dyn VectorStore> =
        Arc::new(JsonVectorStore::new(config.store_dir.clone(), embedder));

    // Rebuild rather than append, so a second launch does not duplicate
    // every record in the collection.
    if store.exists(&args.collection).await? {
        store.delete_collection(&args.collection).await?;
    }
    store.add_documents(&args.collection, &chunks).await?;

    let vector = Arc::new(VectorRetriever::new(
        store,
        args.collection.clone(),
        args.top_k,
    ));
    let lexical = Arc::new(Bm25Retriever::new(chunks, args.top_k));

    Ok(Arc::new(EnsembleRetriever::new(
        vec![(lexical, ENSEMBLE_WEIGHT), (vector, ENSEMBLE_WEIGHT)],
        args.top_k,
    )))
}

/// Run the chat REPL until the user exits.
pub async fn run(config: Config, args: ChatArgs) -> Result<()> {
    let data_dir = config.data_dir.clone();
    Output::info(&format!("loading CSV corpus from {}", data_dir.display()));
    let retriever = build_retriever(&config, &args, &data_dir).await?;

    let model: Arc<dyn ChatModel> = Arc::new(OpenAiChat::new(
        &config.openai_api_key,
        &config.chat_model,
    ));
    let chain = MemoryChain::new(RagChain::new(retriever, model.clone()), model);
    let session_id = Uuid::new_v4().to_string();

    Output::success(&format!(
        "ready — collection '{}', model {}",
        args.collection, config.chat_model
    ));
    Output::info("type a question, or 'exit' to quit");
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        Output::prompt()?;
        let Some(line) = lines.next() else {
            // EOF ends the session like an explicit exit
            println!();
            break;
        };
        let line = line?;
        let trimmed = line.trim();

        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }

        Output::thinking()?;
        match chain.ask(&session_id, ChainInput::Text(trimmed.to_string())).await {
            Ok(Some(answer)) => {
                Output::clear_line()?;
                Output::answer(&answer);
            }
            Ok(None) => {
                Output::clear_line()?;
            }
            Err(e) => {
                Output::clear_line()?;
                Output::error(&e.to_string());
            }
        }
        io::stdout().flush()?;
    }

    Output::info("goodbye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentMetadata;

    #[test]
    fn chunking_keeps_record_metadata() {
        let mut metadata = DocumentMetadata::from_source("pets.csv");
        metadata.row = Some(7);
        let long = "word ".repeat(50);
        let docs = vec![Document::new(long, metadata)];

        let chunker = RecursiveCharacterChunker::new(60);
        let chunks = chunk_documents(&docs, &chunker);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(chunk.metadata.source, "pets.csv");
            assert_eq!(chunk.metadata.row, Some(7));
            assert!(chunk.content.chars().count() <= 60);
        }
    }
}
