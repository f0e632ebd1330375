//! Ollama chat client for backlog questions.

use crate::config::AssistantConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You are a concise operations analyst. \
Answer only from the aggregate backlog data you are given. \
If the data does not support an answer, say so.";

/// Message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Client for the Ollama chat endpoint.
pub struct AssistantClient {
    config: AssistantConfig,
    http_client: reqwest::Client,
}

impl AssistantClient {
    /// Create a new client.
    pub fn new(config: AssistantConfig) -> Result<Self> {
        info!(
            "Initializing assistant with model {} at {}",
            config.model, config.ollama_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request(&self, prompt: &str) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::new("system", SYSTEM_PROMPT),
                ChatMessage::new("user", prompt),
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        }
    }

    /// Send a prompt and return the assistant's answer.
    pub async fn ask(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.config.ollama_url.trim_end_matches('/'));
        debug!("Sending {} byte prompt to {}", prompt.len(), url);

        let response = self
            .http_client
            .post(&url)
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("Request timed out after {}s", self.config.timeout_seconds)
                } else if e.is_connect() {
                    anyhow::anyhow!("Cannot connect to Ollama at {}", self.config.ollama_url)
                } else {
                    anyhow::anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Ollama API error {}: {}", status, body));
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(chat_response.message.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(url: &str) -> AssistantConfig {
        AssistantConfig {
            ollama_url: url.to_string(),
            timeout_seconds: 2,
            ..AssistantConfig::default()
        }
    }

    #[test]
    fn test_request_shape() {
        let client = AssistantClient::new(test_config("http://localhost:11434")).unwrap();
        let request = client.build_request("How many orders?");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama3.2:latest");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "How many orders?");
        assert!(json["options"]["temperature"].is_number());
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"model":"m","message":{"role":"assistant","content":"  Ana is slowest.\n"},"done":true}"#;
        let parsed: OllamaChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.message.content.trim(), "Ana is slowest.");
    }

    #[test]
    fn test_unreachable_server_is_error() {
        let client = AssistantClient::new(test_config("http://127.0.0.1:1")).unwrap();
        let result = tokio_test::block_on(client.ask("hello"));
        assert!(result.is_err());
    }
}
