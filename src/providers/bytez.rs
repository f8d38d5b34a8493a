use anyhow::{Context, Result};
use serde_json::{json, Value};

use super::{error_message, ChatMessage, ImageProvider, ProviderReply, TextProvider};
use crate::config::ModelConfig;

/// HTTP client for Bytez hosted inference.
pub struct BytezClient {
    pub endpoint: String,
    pub model: String,
    api_key: String,
    temperature: f32,
    client: reqwest::Client,
}

impl BytezClient {
    pub fn new(endpoint: String, model: String, api_key: String, temperature: f32) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            api_key,
            temperature,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            anyhow::bail!(
                "No API key for model '{}'. Set api_key in config.toml or BYTEZ_API_KEY",
                config.model
            );
        }
        Ok(Self::new(
            config.endpoint.clone(),
            config.model.clone(),
            config.api_key.clone(),
            config.temperature,
        ))
    }

    fn url(&self) -> String {
        format!("{}/{}", self.endpoint, self.model)
    }

    /// Post a request body and split the reply into error and payload.
    async fn run(&self, body: Value) -> Result<ProviderReply> {
        let response = self
            .client
            .post(self.url())
            .header("Authorization", format!("Key {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Bytez")?;

        let status = response.status();
        let is_image = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("image/"))
            .unwrap_or(false);

        if status.is_success() && is_image {
            let bytes = response
                .bytes()
                .await
                .context("Failed to read image bytes from Bytez")?;
            return Ok(ProviderReply::binary(bytes.to_vec()));
        }

        let text = response
            .text()
            .await
            .context("Failed to read Bytez response")?;

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(error_message))
                .unwrap_or(text);
            return Ok(ProviderReply::error(format!(
                "Bytez API error ({}): {}",
                status, detail
            )));
        }

        let body: Value =
            serde_json::from_str(&text).context("Failed to parse Bytez response")?;
        Ok(ProviderReply::from_envelope(body))
    }
}

#[async_trait::async_trait]
impl TextProvider for BytezClient {
    fn name(&self) -> &str {
        "bytez"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<ProviderReply> {
        let body = json!({
            "messages": messages,
            "stream": false,
            "params": {
                "temperature": self.temperature
            }
        });
        self.run(body).await
    }
}

#[async_trait::async_trait]
impl ImageProvider for BytezClient {
    fn name(&self) -> &str {
        "bytez"
    }

    async fn render(&self, prompt: &str) -> Result<ProviderReply> {
        self.run(json!({ "text": prompt })).await
    }
}
