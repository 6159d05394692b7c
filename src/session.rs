//! QnA session: one per document, owning that document's index and the
//! running conversation history.
//!
//! Lifecycle: a session that fails to construct simply never exists
//! (UNINITIALIZED); [`QnaSession::open`] yields an index-ready session;
//! the first successful [`QnaSession::answer`] moves it to answering,
//! observable as non-empty history.

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::index::VectorIndex;
use crate::llm::questions::{
    build_questions_prompt, parse_questions, QUESTION_ELICITATION_QUERY,
};
use crate::llm::{ChatModel, Embedder};
use crate::loader;
use crate::models::{Answer, ChatMessage};
use crate::synthesize::{self, MAX_HISTORY_TURNS};

/// Chunks retrieved to ground suggested-question generation.
const QUESTION_CONTEXT_CHUNKS: usize = 4;

pub struct QnaSession {
    doc_id: String,
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn ChatModel>,
    history: Vec<ChatMessage>,
}

impl std::fmt::Debug for QnaSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QnaSession")
            .field("doc_id", &self.doc_id)
            .field("index", &self.index)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl QnaSession {
    /// Load the document, then build or load its index.
    ///
    /// The persisted index is used when present and compatible; a corrupt
    /// or dimension-mismatched blob is discarded and the index is rebuilt
    /// from scratch (the caller is responsible for persisting it again).
    /// Loader failures keep their [`Error::Load`] identity; provider
    /// failures during a build surface as [`Error::Initialization`].
    pub async fn open(
        config: &Config,
        doc_id: &str,
        directory: &Path,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let chunks =
            loader::load_directory(directory, config.max_chunk_chars, config.chunk_overlap_chars)?;

        let index_path = config.index_path(doc_id);
        let index = if index_path.exists() {
            match VectorIndex::load(&index_path) {
                Ok(index) if index.dim() == embedder.dim() => {
                    tracing::info!(
                        "Loaded index for {doc_id} from {} ({} chunks)",
                        index_path.display(),
                        index.len()
                    );
                    index
                }
                Ok(index) => {
                    tracing::warn!(
                        "Index for {doc_id} has dimension {}, embedder has {}; rebuilding",
                        index.dim(),
                        embedder.dim()
                    );
                    Self::build_index(doc_id, &chunks, embedder.as_ref()).await?
                }
                Err(e @ Error::CorruptIndex(_)) => {
                    tracing::warn!("Discarding index for {doc_id}: {e}; rebuilding");
                    Self::build_index(doc_id, &chunks, embedder.as_ref()).await?
                }
                Err(e) => return Err(e),
            }
        } else {
            Self::build_index(doc_id, &chunks, embedder.as_ref()).await?
        };

        Ok(Self {
            doc_id: doc_id.to_string(),
            index,
            embedder,
            model,
            history: Vec::new(),
        })
    }

    async fn build_index(
        doc_id: &str,
        chunks: &[crate::models::Chunk],
        embedder: &dyn Embedder,
    ) -> Result<VectorIndex> {
        tracing::info!("Building index for {doc_id} from {} chunks", chunks.len());
        VectorIndex::build(chunks, embedder)
            .await
            .map_err(|e| match e {
                Error::Embedding(msg) | Error::Timeout(msg) => Error::Initialization(format!(
                    "embedding provider unavailable while indexing {doc_id}: {msg}"
                )),
                other => other,
            })
    }

    /// Answer a question against this document's index: retrieve the
    /// top-k chunks, synthesize a grounded answer, record the turn.
    pub async fn answer(&mut self, question: &str, k: usize) -> Result<Answer> {
        let retrieved = self
            .index
            .search(question, k, self.embedder.as_ref())
            .await?;

        let answer =
            synthesize::synthesize(self.model.as_ref(), &self.history, &retrieved, question)
                .await?;

        self.history.push(ChatMessage::user(question));
        self.history.push(ChatMessage::assistant(answer.text.clone()));
        if self.history.len() > MAX_HISTORY_TURNS {
            let excess = self.history.len() - MAX_HISTORY_TURNS;
            self.history.drain(..excess);
        }

        Ok(answer)
    }

    /// Ask the model for `count` citizen-level questions about this act,
    /// grounded in a few retrieved chunks. Fails closed when the reply
    /// does not match the strict list schema.
    pub async fn suggest_questions(&self, count: usize) -> Result<Vec<String>> {
        let retrieved = self
            .index
            .search(
                QUESTION_ELICITATION_QUERY,
                QUESTION_CONTEXT_CHUNKS,
                self.embedder.as_ref(),
            )
            .await?;

        let context_block = synthesize::build_context_block(&retrieved);
        let prompt = build_questions_prompt(count, &context_block);
        let reply = self.model.complete(vec![ChatMessage::user(prompt)]).await?;

        parse_questions(&reply, count)
    }

    /// Serialize the index to `path`; may be called repeatedly, last
    /// call wins.
    pub fn persist(&self, path: &Path) -> Result<()> {
        self.index.save(path)
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }

    /// True once at least one answer has been produced.
    pub fn has_answered(&self) -> bool {
        !self.history.is_empty()
    }
}
