use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::AnswerCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::llm::complete::HttpChatModel;
use crate::llm::embeddings::HttpEmbedder;
use crate::llm::{ChatModel, Embedder};
use crate::models::Document;
use crate::session::QnaSession;

/// Shared application state.
///
/// Each document gets its own session behind a `tokio::sync::Mutex`, so
/// answering is serialized per document while distinct documents proceed
/// independently. Index files are path-namespaced per document id.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub documents: Arc<RwLock<Vec<Document>>>,
    pub cache: Arc<AnswerCache>,
    pub embedder: Arc<dyn Embedder>,
    pub model: Arc<dyn ChatModel>,
    sessions: Arc<tokio::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<QnaSession>>>>>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(config.docs_dir())?;
        std::fs::create_dir_all(config.index_dir())?;

        // Load the persisted document registry
        let documents = if config.db_path().exists() {
            let data = std::fs::read_to_string(config.db_path())?;
            serde_json::from_str(&data).unwrap_or_default()
        } else {
            Vec::new()
        };

        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(
                config.llm.request_timeout_secs,
            ))
            .build()?;

        let embedder = HttpEmbedder::new(
            http_client.clone(),
            config.llm.clone(),
            config.retry.clone(),
        );
        let model = HttpChatModel::new(http_client, config.llm.clone(), config.retry.clone());

        Ok(Self {
            config,
            documents: Arc::new(RwLock::new(documents)),
            cache: Arc::new(AnswerCache::new()),
            embedder: Arc::new(embedder),
            model: Arc::new(model),
            sessions: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
        })
    }

    pub fn document(&self, doc_id: &str) -> Option<Document> {
        self.documents.read().iter().find(|d| d.id == doc_id).cloned()
    }

    /// Get the open session for a document, constructing it on first use.
    /// Construction happens at most once; a failed construction leaves no
    /// session behind, so the next call retries from scratch.
    pub async fn session(&self, doc_id: &str) -> Result<Arc<tokio::sync::Mutex<QnaSession>>> {
        let document = self
            .document(doc_id)
            .ok_or_else(|| Error::Initialization(format!("unknown document: {doc_id}")))?;

        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(doc_id) {
            return Ok(session.clone());
        }

        let session = QnaSession::open(
            &self.config,
            doc_id,
            &document.path,
            self.embedder.clone(),
            self.model.clone(),
        )
        .await?;

        // First build: persist the index so later sessions load it
        session.persist(&self.config.index_path(doc_id))?;

        {
            let mut documents = self.documents.write();
            if let Some(doc) = documents.iter_mut().find(|d| d.id == doc_id) {
                doc.chunk_count = session.chunk_count();
            }
        }
        self.persist_documents();

        let session = Arc::new(tokio::sync::Mutex::new(session));
        sessions.insert(doc_id.to_string(), session.clone());
        Ok(session)
    }

    /// Persist the document registry to disk (atomic write via temp file + rename).
    pub fn persist_documents(&self) {
        let documents = self.documents.read();
        if let Ok(data) = serde_json::to_string_pretty(&*documents) {
            let db_path = self.config.db_path();
            let tmp_path = db_path.with_extension("json.tmp");
            if std::fs::write(&tmp_path, &data).is_ok() {
                let _ = std::fs::rename(&tmp_path, &db_path);
            }
        }
    }
}
