use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where downloaded acts, indexes and the document registry are stored
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Retry policy for provider calls
    pub retry: RetryConfig,
    /// Maximum characters per chunk
    pub max_chunk_chars: usize,
    /// Characters carried over from the previous chunk
    pub chunk_overlap_chars: usize,
    /// Retrieved chunks per question
    pub retrieval_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for answer synthesis
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Embedding vector dimension
    pub embedding_dim: usize,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Bounded retry with exponential backoff for transient provider failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 disables retry)
    pub max_retries: u32,
    /// Delay before the first retry; doubles each attempt
    pub base_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9100".to_string(),
            llm: LlmConfig::default(),
            retry: RetryConfig::default(),
            max_chunk_chars: 1500,
            chunk_overlap_chars: 200,
            retrieval_k: 3,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            api_key: None,
            embedding_dim: 768,
            request_timeout_secs: 120,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("LEX_QA_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("LEX_QA_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("LLM_EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.llm.embedding_dim = d;
            }
        }
        if let Ok(val) = std::env::var("LLM_REQUEST_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.llm.request_timeout_secs = v;
            }
        }
        if let Ok(val) = std::env::var("LEX_QA_MAX_RETRIES") {
            if let Ok(v) = val.parse() {
                config.retry.max_retries = v;
            }
        }
        if let Ok(val) = std::env::var("LEX_QA_RETRY_BASE_DELAY_MS") {
            if let Ok(v) = val.parse() {
                config.retry.base_delay_ms = v;
            }
        }
        if let Ok(val) = std::env::var("LEX_QA_MAX_CHUNK_CHARS") {
            if let Ok(v) = val.parse() {
                config.max_chunk_chars = v;
            }
        }
        if let Ok(val) = std::env::var("LEX_QA_CHUNK_OVERLAP_CHARS") {
            if let Ok(v) = val.parse() {
                config.chunk_overlap_chars = v;
            }
        }
        if let Ok(val) = std::env::var("LEX_QA_RETRIEVAL_K") {
            if let Ok(v) = val.parse::<usize>() {
                config.retrieval_k = v.max(1);
            }
        }

        config
    }

    /// One subdirectory per document, keyed by its registry address.
    pub fn docs_dir(&self) -> PathBuf {
        self.data_dir.join("docs")
    }

    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("indexes")
    }

    pub fn index_path(&self, doc_id: &str) -> PathBuf {
        self.index_dir().join(format!("{doc_id}.index"))
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("documents.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_path_is_namespaced_per_document() {
        let config = Config::default();
        let a = config.index_path("DU20230001");
        let b = config.index_path("DU20230002");
        assert_ne!(a, b);
        assert!(a.ends_with("DU20230001.index"));
    }

    #[test]
    fn test_defaults_sane() {
        let config = Config::default();
        assert!(config.chunk_overlap_chars < config.max_chunk_chars);
        assert!(config.retrieval_k >= 1);
    }
}
