//! Ollama LLM provider for local inference

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::config::LlmConfig;
use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};

/// Ollama chat API request format
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama chat API response format
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatReply,
    model: String,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

/// Ollama provider for local LLM inference
#[derive(Debug)]
pub struct OllamaProvider {
    /// Base URL for Ollama API
    base_url: String,
    /// Model to use (e.g., "llama3", "mistral")
    model: String,
    /// HTTP client
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider with default settings
    pub fn new(model: &str) -> Self {
        Self::with_url("http://localhost:11434", model)
    }

    /// Create with custom base URL
    pub fn with_url(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::with_url(&config.ollama_url, &config.model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();
        let url = format!("{}/api/chat", self.base_url);

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.persona,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::RequestFailed(format!("Status: {}", response.status())));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(model = %reply.model, latency_ms, "Ollama completion");

        Ok(LlmResponse {
            content: reply.message.content,
            model: reply.model,
            tokens_used: reply.eval_count,
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_shape() {
        let body = ChatRequest {
            model: "llama3",
            messages: vec![ChatMessage {
                role: "system",
                content: "You are Sgt. Morgan",
            }],
            stream: false,
            options: ChatOptions {
                temperature: 0.5,
                num_predict: 64,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["options"]["num_predict"], 64);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_reply_parsing() {
        let raw = r#"{"model":"llama3","message":{"role":"assistant","content":"Hold position."},
            "done":true}"#;
        let reply: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(reply.message.content, "Hold position.");
        assert_eq!(reply.eval_count, None);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider = OllamaProvider::with_url("http://gpu-box:11434/", "llama3");
        assert_eq!(provider.base_url, "http://gpu-box:11434");
    }

    #[tokio::test]
    #[ignore = "Requires Ollama running locally"]
    async fn test_ollama_speaks_in_character() {
        let provider = OllamaProvider::new("llama3");
        if provider.is_available().await {
            let request = LlmRequest::with_persona(
                "You are Specialist Patel, the Scout of a five-member advisory squad.",
                "Scenario: Hold the bridge\nYour position: neutral (50% confidence)",
            );
            let response = provider.complete(request).await.unwrap();
            assert!(!response.text().is_empty());
        }
    }
}
