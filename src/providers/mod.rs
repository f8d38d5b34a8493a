pub mod bytez;
pub mod ollama;

pub use bytez::BytezClient;
pub use ollama::OllamaClient;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::config::ModelConfig;

/// One message of a conversation sent to a text model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Payload of a successful call, shape unknown until normalized.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    Json(Value),
    Binary(Vec<u8>),
}

/// What a provider handed back when the call itself went through.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    /// Error explicitly reported by the remote side.
    pub error: Option<String>,
    pub output: RawOutput,
}

impl ProviderReply {
    pub fn output(output: Value) -> Self {
        Self { error: None, output: RawOutput::Json(output) }
    }

    pub fn binary(bytes: Vec<u8>) -> Self {
        Self { error: None, output: RawOutput::Binary(bytes) }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { error: Some(message.into()), output: RawOutput::Json(Value::Null) }
    }

    /// Split an `{ "error": ..., "output": ... }` envelope.
    pub fn from_envelope(body: Value) -> Self {
        let error = body.get("error").and_then(error_message);
        let output = body.get("output").cloned().unwrap_or(Value::Null);
        Self { error, output: RawOutput::Json(output) }
    }
}

/// Render a remote error value as text; `null`, `false` and `""` mean no error.
pub(crate) fn error_message(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(value.to_string())),
        other => Some(other.to_string()),
    }
}

/// Remote text-generation capability.
///
/// `Err` is a transport or protocol fault; an explicit remote failure comes
/// back as `Ok` with `error` set.
#[async_trait::async_trait]
pub trait TextProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ProviderReply>;
}

/// Remote image-generation capability.
#[async_trait::async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn render(&self, prompt: &str) -> Result<ProviderReply>;
}

/// Create the text provider named in the configuration
pub fn create_text_provider(config: &ModelConfig) -> Result<Box<dyn TextProvider>> {
    match config.provider.as_str() {
        "bytez" => Ok(Box::new(BytezClient::from_config(config)?)),
        "ollama" => Ok(Box::new(OllamaClient::from_config(config))),
        other => anyhow::bail!("Unknown text provider '{}'. Use 'bytez' or 'ollama'", other),
    }
}

/// Create the image provider named in the configuration
pub fn create_image_provider(config: &ModelConfig) -> Result<Box<dyn ImageProvider>> {
    match config.provider.as_str() {
        "bytez" => Ok(Box::new(BytezClient::from_config(config)?)),
        "ollama" => anyhow::bail!("Ollama cannot generate images. Use 'bytez' for [image_model]"),
        other => anyhow::bail!("Unknown image provider '{}'. Use 'bytez'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_envelope_success() {
        let reply = ProviderReply::from_envelope(json!({ "error": null, "output": "hi" }));
        assert_eq!(reply.error, None);
        assert_eq!(reply.output, RawOutput::Json(json!("hi")));
    }

    #[test]
    fn test_from_envelope_error() {
        let reply = ProviderReply::from_envelope(json!({ "error": "Rate limited", "output": null }));
        assert_eq!(reply.error.as_deref(), Some("Rate limited"));

        let nested = ProviderReply::from_envelope(json!({ "error": { "message": "Bad key" } }));
        assert_eq!(nested.error.as_deref(), Some("Bad key"));
    }

    #[test]
    fn test_from_envelope_missing_output() {
        let reply = ProviderReply::from_envelope(json!({}));
        assert_eq!(reply.error, None);
        assert_eq!(reply.output, RawOutput::Json(Value::Null));
    }

    #[test]
    fn test_error_message_ignores_empty_values() {
        assert_eq!(error_message(&json!("")), None);
        assert_eq!(error_message(&json!(false)), None);
        assert_eq!(error_message(&json!(500)).as_deref(), Some("500"));
    }

    fn model(provider: &str) -> ModelConfig {
        ModelConfig {
            provider: provider.to_string(),
            model: "m".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            api_key: "key".to_string(),
            temperature: 0.7,
        }
    }

    #[test]
    fn test_provider_factory() {
        assert_eq!(create_text_provider(&model("ollama")).unwrap().name(), "ollama");
        assert_eq!(create_text_provider(&model("bytez")).unwrap().name(), "bytez");
        assert!(create_text_provider(&model("mystery")).is_err());
        assert!(create_image_provider(&model("ollama")).is_err());
        assert_eq!(create_image_provider(&model("bytez")).unwrap().name(), "bytez");
    }
}
