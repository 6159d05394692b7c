use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered legislative act.
///
/// `id` is the registry address of the act and doubles as the key for its
/// index file and cache entries. A document is immutable once registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    /// Where the act was originally fetched from, if known
    pub origin_url: Option<String>,
    /// Local directory holding the act's files
    pub path: std::path::PathBuf,
    pub added_at: DateTime<Utc>,
    /// Chunks indexed for this document; 0 until a session is opened
    pub chunk_count: usize,
}

/// A bounded span of document text, the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    /// File path relative to the document directory, cited as provenance
    pub source_id: String,
    pub chunk_index: usize,
}

/// A chunk returned from similarity search, best-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub source_id: String,
    pub chunk_index: usize,
    pub score: f32,
}

/// A synthesized answer with the provenance actually used.
/// Never mutated after creation; a cache hit returns it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

/// A single conversation turn sent to the language model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

// ─── HTTP API types ──────────────────────────────────────

/// Register-document request
#[derive(Debug, Clone, Deserialize)]
pub struct AddDocumentRequest {
    /// Registry address of the act
    pub id: String,
    pub title: String,
    /// Local directory containing the act's files
    pub path: String,
    pub origin_url: Option<String>,
}

/// Ask request
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub document_id: String,
    pub question: String,
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    3
}

/// Ask response
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<String>,
    /// True when the answer came from the cache, not the model
    pub cached: bool,
}

/// Suggested-questions request
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestQuestionsRequest {
    pub document_id: String,
    #[serde(default = "default_question_count")]
    pub count: usize,
}

fn default_question_count() -> usize {
    6
}

/// Suggested-questions response
#[derive(Debug, Clone, Serialize)]
pub struct SuggestQuestionsResponse {
    pub document_id: String,
    pub questions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_request_defaults_k_to_three() {
        let req: AskRequest =
            serde_json::from_str(r#"{"document_id":"DU1","question":"What?"}"#).unwrap();
        assert_eq!(req.k, 3);
    }

    #[test]
    fn test_suggest_request_defaults_to_six() {
        let req: SuggestQuestionsRequest =
            serde_json::from_str(r#"{"document_id":"DU1"}"#).unwrap();
        assert_eq!(req.count, 6);
    }

    #[test]
    fn test_answer_round_trips() {
        let answer = Answer {
            text: "Art. 1 says...\n\nSOURCES: act.pdf".to_string(),
            sources: vec!["act.pdf".to_string()],
        };
        let json = serde_json::to_string(&answer).unwrap();
        let back: Answer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, answer);
    }
}
