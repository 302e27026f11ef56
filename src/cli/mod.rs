//! Command-line interface.

pub mod chat;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::cli::output::Output;
use crate::config::Config;
use crate::db::JsonVectorStore;
use crate::rag::{CharacterChunker, IngestOutcome, IngestPipeline, OpenAiEmbedder, RateLimitedEmbedder};
use crate::types::Result;

#[derive(Parser)]
#[command(name = "quarry", version, about = "Retrieval-augmented question answering over local documents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chunk and embed a text file into a vector store collection
    Ingest {
        /// Text file to ingest
        source: PathBuf,

        /// Collection name inside the vector store
        #[arg(short, long, default_value = "documents")]
        collection: String,

        /// Base directory for the vector store (overrides QUARRY_STORE_DIR)
        #[arg(long)]
        store_dir: Option<PathBuf>,
    },

    /// Chat over the CSV corpus with hybrid retrieval
    Chat {
        /// Collection name for the QA corpus embeddings
        #[arg(short, long, default_value = "records")]
        collection: String,

        /// Documents each retriever contributes per question
        #[arg(long, default_value_t = crate::db::DEFAULT_TOP_K)]
        top_k: usize,

        /// Directory scanned for CSV files (overrides QUARRY_DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Base directory for the vector store (overrides QUARRY_STORE_DIR)
        #[arg(long)]
        store_dir: Option<PathBuf>,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env()?;
    Output::banner(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Ingest {
            source,
            collection,
            store_dir,
        } => {
            if let Some(dir) = store_dir {
                config.store_dir = dir;
            }
            let embedder = Arc::new(RateLimitedEmbedder::new(
                Arc::new(OpenAiEmbedder::new(
                    &config.openai_api_key,
                    &config.embedding_model,
                )),
                Duration::from_millis(config.embed_delay_ms),
            ));
            let store = Arc::new(JsonVectorStore::new(config.store_dir.clone(), embedder));
            let pipeline = IngestPipeline::new(
                store,
                Box::new(CharacterChunker::new(config.chunk_size)),
            );

            match pipeline.run(&source, &collection).await? {
                IngestOutcome::AlreadyInitialized => {
                    Output::info(&format!(
                        "collection '{}' already exists, nothing to do",
                        collection
                    ));
                }
                IngestOutcome::Created { chunks } => {
                    Output::success(&format!(
                        "ingested {} into '{}' ({} chunks)",
                        source.display(),
                        collection,
                        chunks
                    ));
                }
            }
            Ok(())
        }
        Commands::Chat {
            collection,
            top_k,
            data_dir,
            store_dir,
        } => {
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(dir) = store_dir {
                config.store_dir = dir;
            }
            chat::run(config, chat::ChatArgs { collection, top_k }).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_command_parses_directory_overrides() {
        let cli = Cli::try_parse_from([
            "quarry", "chat", "--collection", "meds", "--top-k", "6", "--data-dir", "/tmp/csvs",
            "--store-dir", "/tmp/vectors",
        ])
        .unwrap();

        match cli.command {
            Commands::Chat {
                collection,
                top_k,
                data_dir,
                store_dir,
            } => {
                assert_eq!(collection, "meds");
                assert_eq!(top_k, 6);
                assert_eq!(data_dir, Some(PathBuf::from("/tmp/csvs")));
                assert_eq!(store_dir, Some(PathBuf::from("/tmp/vectors")));
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn ingest_command_defaults_leave_directories_to_config() {
        let cli = Cli::try_parse_from(["quarry", "ingest", "notes.txt"]).unwrap();

        match cli.command {
            Commands::Ingest {
                source,
                collection,
                store_dir,
            } => {
                assert_eq!(source, PathBuf::from("notes.txt"));
                assert_eq!(collection, "documents");
                assert_eq!(store_dir, None);
            }
            _ => panic!("expected ingest command"),
        }
    }

    #[test]
    fn ingest_command_accepts_store_dir_override() {
        let cli =
            Cli::try_parse_from(["quarry", "ingest", "notes.txt", "--store-dir", "/tmp/s"]).unwrap();

        match cli.command {
            Commands::Ingest { store_dir, .. } => {
                assert_eq!(store_dir, Some(PathBuf::from("/tmp/s")));
            }
            _ => panic!("expected ingest command"),
        }
    }
}
