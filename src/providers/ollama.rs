use anyhow::{Context, Result};
use serde_json::Value;

use super::{error_message, ChatMessage, ProviderReply, TextProvider};
use crate::config::ModelConfig;

/// HTTP client for a local Ollama server.
pub struct OllamaClient {
    pub endpoint: String,
    pub model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(endpoint: String, model: String, temperature: f32) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            temperature,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.endpoint.clone(), config.model.clone(), config.temperature)
    }

    fn request_body(&self, messages: &[ChatMessage]) -> Value {
        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "options": {
                "temperature": self.temperature
            }
        })
    }
}

#[async_trait::async_trait]
impl TextProvider for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    /// Send a chat request; the whole response body is the payload.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ProviderReply> {
        let response = self.client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&self.request_body(messages))
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Ok(ProviderReply::error(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let response_json: Value = response.json().await
            .context("Failed to parse Ollama response")?;

        if let Some(message) = response_json.get("error").and_then(error_message) {
            return Ok(ProviderReply::error(message));
        }

        Ok(ProviderReply::output(response_json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let client = OllamaClient::new("http://localhost:11434/".to_string(), "llama3".to_string(), 0.5);
        let body = client.request_body(&[
            ChatMessage::system("be brief"),
            ChatMessage::user("hello"),
        ]);

        assert_eq!(client.endpoint, "http://localhost:11434");
        assert_eq!(body["model"], "llama3");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert_eq!(body["options"]["temperature"], 0.5);
    }
}
