//! Question-answering chains.
//!
//! [`ChainInput`] normalizes the shapes a question can arrive in before
//! any retrieval work happens. [`RagChain`] is the stateless core:
//! retrieve context, render the system prompt, ask the model.
//! [`MemoryChain`] wraps it with session histories and reformulates
//! follow-up questions into standalone ones so retrieval still works
//! when the user says "and what about its side effects?".

pub mod session;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::llm::ChatModel;
use crate::rag::retriever::Retriever;
use crate::types::{AppError, Document, Message, Result};

pub use session::SessionStore;

/// System prompt for answering from retrieved context. `{context}` is
/// replaced with the concatenated retrieved chunks.
pub const RAG_SYSTEM_TEMPLATE: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, just say that you don't know. \
Use three sentences maximum and keep the answer concise.\n\n{context}";

/// System prompt for rewriting a follow-up question into a standalone
/// one, given the chat history.
pub const CONTEXTUALIZE_SYSTEM_PROMPT: &str = "Given a chat history and the latest user question \
which might reference context in the chat history, formulate a standalone question \
which can be understood without the chat history. Do NOT answer the question, \
just reformulate it if needed and otherwise return it as is.";

/// A question on its way into a chain, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainInput {
    Null,
    Text(String),
    /// A keyed payload; the question lives under the `question` key.
    Map(serde_json::Map<String, Value>),
    Message(Message),
}

impl ChainInput {
    /// Reduce the input to the question text.
    ///
    /// `Ok(None)` means "nothing to ask" (null, or blank text); the
    /// caller should skip the turn. A map without a `question` key, or
    /// a non-string payload, is an invalid-input error.
    pub fn normalize(&self) -> Result<Option<String>> {
        let text = match self {
            ChainInput::Null => return Ok(None),
            ChainInput::Text(text) => text.clone(),
            ChainInput::Message(message) => message.content.clone(),
            ChainInput::Map(map) => match map.get("question") {
                Some(Value::String(text)) => text.clone(),
                Some(other) => {
                    return Err(AppError::InvalidInput(format!(
                        "'question' must be a string, got: {}",
                        other
                    )))
                }
                None => {
                    return Err(AppError::InvalidInput(
                        "Input object has no 'question' key".into(),
                    ))
                }
            },
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            Ok(None)
        } else {
            Ok(Some(trimmed.to_string()))
        }
    }
}

impl TryFrom<Value> for ChainInput {
    type Error = AppError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(ChainInput::Null),
            Value::String(text) => Ok(ChainInput::Text(text)),
            Value::Object(map) => Ok(ChainInput::Map(map)),
            other => Err(AppError::InvalidInput(format!(
                "Unsupported input type: {}",
                other
            ))),
        }
    }
}

/// Join retrieved documents into the context block for the prompt.
pub fn format_context(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Stateless retrieval-augmented chain: one question in, one grounded
/// answer out.
pub struct RagChain {
    retriever: Arc<dyn Retriever>,
    model: Arc<dyn ChatModel>,
    system_template: String,
}

impl RagChain {
    pub fn new(retriever: Arc<dyn Retriever>, model: Arc<dyn ChatModel>) -> Self {
        Self {
            retriever,
            model,
            system_template: RAG_SYSTEM_TEMPLATE.to_string(),
        }
    }

    pub fn with_system_template(mut self, template: impl Into<String>) -> Self {
        self.system_template = template.into();
        self
    }

    /// Answer a normalized question. `history` is forwarded to the
    /// model for conversational tone; retrieval uses only `question`.
    pub async fn invoke(&self, question: &str, history: &[Message]) -> Result<String> {
        let documents = self.retriever.retrieve(question).await?;
        debug!(retrieved = documents.len(), "retrieved context for question");

        let system = self
            .system_template
            .replace("{context}", &format_context(&documents));

        let mut messages = history.to_vec();
        messages.push(Message::user(question));
        self.model.complete(&system, &messages).await
    }
}

/// Conversational chain: session histories plus question reformulation
/// on top of a [`RagChain`].
pub struct MemoryChain {
    base: RagChain,
    model: Arc<dyn ChatModel>,
    sessions: SessionStore,
}

impl MemoryChain {
    pub fn new(base: RagChain, model: Arc<dyn ChatModel>) -> Self {
        Self {
            base,
            model,
            sessions: SessionStore::new(),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Rewrite a follow-up question into a standalone one. Only called
    /// when the session already has history.
    async fn reformulate(&self, question: &str, history: &[Message]) -> Result<String> {
        let mut messages = history.to_vec();
        messages.push(Message::user(question));
        let standalone = self
            .model
            .complete(CONTEXTUALIZE_SYSTEM_PROMPT, &messages)
            .await?;
        info!(original = question, standalone = %standalone, "reformulated follow-up question");
        Ok(standalone)
    }

    /// Run one conversational turn.
    ///
    /// Returns `Ok(None)` when the input normalizes to nothing; the
    /// session history is untouched in that case. On any error, nothing
    /// is appended either, so a failed turn can simply be retried.
    pub async fn ask(&self, session_id: &str, input: ChainInput) -> Result<Option<String>> {
        let Some(question) = input.normalize()? else {
            return Ok(None);
        };

        let history = self.sessions.history(session_id);
        let standalone = if history.is_empty() {
            question.clone()
        } else {
            self.reformulate(&question, &history).await?
        };

        let answer = self.base.invoke(&standalone, &history).await?;

        self.sessions.append(session_id, Message::user(&question));
        self.sessions.append(session_id, Message::assistant(&answer));
        Ok(Some(answer))
    }
}
