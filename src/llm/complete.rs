use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{LlmConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::llm::{backoff_delay, map_transport_err, ChatModel};

/// [`ChatModel`] backed by an Ollama or OpenAI-compatible chat API.
///
/// Completions are requested whole (no streaming) because answers are
/// cached and returned verbatim. Transient failures get bounded retry.
pub struct HttpChatModel {
    client: reqwest::Client,
    config: LlmConfig,
    retry: RetryConfig,
}

impl HttpChatModel {
    pub fn new(client: reqwest::Client, config: LlmConfig, retry: RetryConfig) -> Self {
        Self {
            client,
            config,
            retry,
        }
    }

    async fn complete_ollama(&self, messages: &[Message]) -> Result<String> {
        let url = format!("{}/api/chat", self.config.base_url);

        let req = OllamaChatRequest {
            model: self.config.chat_model.clone(),
            messages: messages.to_vec(),
            stream: false,
        };

        let resp = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .json(&req)
            .send()
            .await
            .map_err(|e| map_transport_err(e, "Ollama chat API", Error::Synthesis))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!(
                "Ollama chat API returned {status}: {body}"
            )));
        }

        let body: OllamaChatResponse = resp
            .json()
            .await
            .map_err(|e| Error::Synthesis(format!("malformed Ollama chat response: {e}")))?;

        Ok(body.message.content)
    }

    async fn complete_openai(&self, messages: &[Message]) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let req = OpenAiChatRequest {
            model: self.config.chat_model.clone(),
            messages: messages.to_vec(),
            temperature: 0.0,
        };

        let resp = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&req)
            .send()
            .await
            .map_err(|e| map_transport_err(e, "OpenAI chat API", Error::Synthesis))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!(
                "OpenAI chat API returned {status}: {body}"
            )));
        }

        let body: OpenAiChatResponse = resp
            .json()
            .await
            .map_err(|e| Error::Synthesis(format!("malformed OpenAI chat response: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Synthesis("OpenAI chat response had no choices".to_string()))
    }
}

#[async_trait]
impl ChatModel for HttpChatModel {
    async fn complete(&self, messages: Vec<crate::models::ChatMessage>) -> Result<String> {
        let messages: Vec<Message> = messages
            .into_iter()
            .map(|m| Message {
                role: m.role,
                content: m.content,
            })
            .collect();

        let mut attempt = 0u32;
        loop {
            let result = match self.config.provider.as_str() {
                "ollama" => self.complete_ollama(&messages).await,
                "openai" => self.complete_openai(&messages).await,
                other => {
                    return Err(Error::Synthesis(format!("unknown LLM provider: {other}")))
                }
            };

            match result {
                Ok(content) => return Ok(content),
                Err(e) if attempt < self.retry.max_retries && e.is_transient() => {
                    let delay = backoff_delay(&self.retry, attempt);
                    tracing::warn!(
                        "Chat attempt {} failed: {e}; retrying in {}ms",
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
}

#[derive(Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Message,
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: String,
}
