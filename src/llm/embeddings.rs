use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{LlmConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::llm::{backoff_delay, map_transport_err, Embedder};

/// Maximum characters to send per text to the embedding API.
/// nomic-embed-text has an 8 192-token context; legal prose tokenises at
/// roughly 1 token per 2-3 chars, so 3 000 chars stays safely under it.
const MAX_EMBED_CHARS: usize = 3_000;

/// Truncate `text` to at most `MAX_EMBED_CHARS`, splitting on a UTF-8 char boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// [`Embedder`] backed by an Ollama or OpenAI-compatible embedding API.
///
/// Transient failures are retried with bounded exponential backoff; vectors
/// whose length differs from the configured dimension are rejected as
/// malformed rather than truncated or padded.
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: LlmConfig,
    retry: RetryConfig,
}

impl HttpEmbedder {
    pub fn new(client: reqwest::Client, config: LlmConfig, retry: RetryConfig) -> Self {
        Self {
            client,
            config,
            retry,
        }
    }

    async fn embed_with_retry(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut attempt = 0u32;
        loop {
            let result = match self.config.provider.as_str() {
                "ollama" => self.embed_ollama(batch).await,
                "openai" => self.embed_openai(batch).await,
                other => {
                    return Err(Error::Embedding(format!("unknown LLM provider: {other}")))
                }
            };

            match result {
                Ok(vectors) => return Ok(vectors),
                Err(e) if attempt < self.retry.max_retries && e.is_transient() => {
                    let delay = backoff_delay(&self.retry, attempt);
                    tracing::warn!(
                        "Embedding attempt {} failed: {e}; retrying in {}ms",
                        attempt + 1,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn embed_ollama(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.config.base_url);

        let req = OllamaEmbedRequest {
            model: self.config.embedding_model.clone(),
            input: texts.to_vec(),
            truncate: true,
        };

        let resp = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .json(&req)
            .send()
            .await
            .map_err(|e| map_transport_err(e, "Ollama embed API", Error::Embedding))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "Ollama embed API returned {status}: {body}"
            )));
        }

        let body: OllamaEmbedResponse = resp
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("malformed Ollama embed response: {e}")))?;

        Ok(body.embeddings)
    }

    async fn embed_openai(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.config.base_url);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let req = OpenAiEmbedRequest {
            model: self.config.embedding_model.clone(),
            input: texts.to_vec(),
        };

        let resp = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&req)
            .send()
            .await
            .map_err(|e| map_transport_err(e, "OpenAI embed API", Error::Embedding))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "OpenAI embed API returned {status}: {body}"
            )));
        }

        let body: OpenAiEmbedResponse = resp
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("malformed OpenAI embed response: {e}")))?;

        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dim(&self) -> usize {
        self.config.embedding_dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let truncated: Vec<String> = texts
            .iter()
            .map(|t| truncate_for_embedding(t).to_string())
            .collect();

        let batch_size = 32;
        let mut all_embeddings = Vec::with_capacity(truncated.len());

        for batch in truncated.chunks(batch_size) {
            all_embeddings.extend(self.embed_with_retry(batch).await?);
        }

        if all_embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "provider returned {} embeddings for {} texts",
                all_embeddings.len(),
                texts.len()
            )));
        }
        for vector in &all_embeddings {
            if vector.len() != self.config.embedding_dim {
                return Err(Error::Embedding(format!(
                    "provider returned a {}-dimensional vector, expected {}",
                    vector.len(),
                    self.config.embedding_dim
                )));
            }
        }

        Ok(all_embeddings)
    }
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
    /// Ask Ollama to truncate over-length inputs instead of returning 400.
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_for_embedding("Art. 1"), "Art. 1");
    }

    #[test]
    fn test_truncate_long_text() {
        let long = "a".repeat(10_000);
        assert_eq!(truncate_for_embedding(&long).len(), MAX_EMBED_CHARS);
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let long = "ą".repeat(5_000); // 2 bytes per char
        let truncated = truncate_for_embedding(&long);
        assert!(truncated.len() <= MAX_EMBED_CHARS);
        assert!(truncated.is_char_boundary(truncated.len()));
    }
}
