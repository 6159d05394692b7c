//! Provider plumbing: capability traits for the embedding and language
//! model services, plus their HTTP implementations (Ollama and
//! OpenAI-compatible APIs).

pub mod complete;
pub mod embeddings;
pub mod questions;

use async_trait::async_trait;

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::models::ChatMessage;

/// External capability converting text to fixed-dimension vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Dimension of the embedding space.
    fn dim(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("provider returned no embedding".to_string()))
    }
}

/// External language model producing one completion for a conversation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String>;
}

/// Exponential backoff delay for retry attempt `attempt` (0-based).
pub(crate) fn backoff_delay(retry: &RetryConfig, attempt: u32) -> std::time::Duration {
    std::time::Duration::from_millis(retry.base_delay_ms.saturating_mul(2u64.pow(attempt)))
}

/// Map a reqwest failure to the taxonomy: elapsed deadlines become
/// [`Error::Timeout`], everything else the caller's provider error.
pub(crate) fn map_transport_err(
    e: reqwest::Error,
    what: &str,
    provider_err: fn(String) -> Error,
) -> Error {
    if e.is_timeout() {
        Error::Timeout(format!("{what}: {e}"))
    } else {
        provider_err(format!("{what}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let retry = RetryConfig {
            max_retries: 3,
            base_delay_ms: 100,
        };
        assert_eq!(backoff_delay(&retry, 0).as_millis(), 100);
        assert_eq!(backoff_delay(&retry, 1).as_millis(), 200);
        assert_eq!(backoff_delay(&retry, 2).as_millis(), 400);
    }
}
