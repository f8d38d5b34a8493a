pub mod resource;
pub mod shape;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;

use crate::config::Config;
use crate::providers::{
    create_image_provider, create_text_provider, ChatMessage, ImageProvider, ProviderReply,
    RawOutput, TextProvider,
};
use crate::text::clean;
pub use resource::{ImageSource, TransientImage};
use shape::{ImagePayload, ResolvedImage, TextPayload};

/// Failure of one model call, as shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// The remote side reported the failure itself.
    #[error("{0}")]
    Provider(String),

    #[error("Failed to generate text")]
    TextTransport,

    #[error("Failed to generate image")]
    ImageTransport,

    #[error("No output was generated. Please try again.")]
    EmptyText,

    #[error("No image was generated. Please try again.")]
    EmptyImage,
}

/// Outcome of one model call: either an error or a non-empty output, never both.
#[derive(Debug)]
pub struct GenerationResult {
    error: Option<GenerationError>,
    output: String,
    resource: Option<TransientImage>,
}

impl GenerationResult {
    pub fn failure(error: GenerationError) -> Self {
        Self { error: Some(error), output: String::new(), resource: None }
    }

    pub fn text(output: impl Into<String>) -> Self {
        let output = output.into();
        if output.is_empty() {
            return Self::failure(GenerationError::EmptyText);
        }
        Self { error: None, output, resource: None }
    }

    pub fn image(reference: impl Into<String>, resource: Option<TransientImage>) -> Self {
        let output = reference.into();
        if output.is_empty() {
            return Self::failure(GenerationError::EmptyImage);
        }
        Self { error: None, output, resource }
    }

    pub fn error(&self) -> Option<&GenerationError> {
        self.error.as_ref()
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_parts(self) -> (Result<String, GenerationError>, Option<TransientImage>) {
        match self.error {
            Some(error) => (Err(error), None),
            None => (Ok(self.output), self.resource),
        }
    }
}

/// Upper bound for fetching a generated image by URL.
const IMAGE_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Sole adapter between tools and the remote model capabilities.
pub struct ModelGateway {
    text: Box<dyn TextProvider>,
    image: Option<Box<dyn ImageProvider>>,
    temp_dir: PathBuf,
    http: reqwest::Client,
}

impl ModelGateway {
    pub fn new(
        text: Box<dyn TextProvider>,
        image: Option<Box<dyn ImageProvider>>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            text,
            image,
            temp_dir: temp_dir.into(),
            http: download_client(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let text = create_text_provider(&config.text_model)?;
        let image = match &config.image_model {
            Some(model) => Some(create_image_provider(model)?),
            None => {
                log::warn!("No [image_model] configured, image tools are disabled");
                None
            }
        };
        Ok(Self::new(text, image, &config.output.temp_dir))
    }

    pub fn text_provider(&self) -> &str {
        self.text.name()
    }

    pub fn image_provider(&self) -> Option<&str> {
        self.image.as_ref().map(|p| p.name())
    }

    /// Send a prompt (plus optional system message) and return cleaned text.
    pub async fn generate_text(&self, prompt: &str, system_prompt: Option<&str>) -> GenerationResult {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt.filter(|s| !s.trim().is_empty()) {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        log::info!(
            "Gateway: text request to {} ({} chars)",
            self.text.name(),
            prompt.len()
        );

        let reply = match self.text.complete(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("Gateway: text request failed: {:#}", e);
                return GenerationResult::failure(GenerationError::TextTransport);
            }
        };

        let result = normalize_text_reply(reply);
        match result.error() {
            Some(e) => log::warn!("Gateway: text generation failed: {}", e),
            None => log::info!("Gateway: received {} chars", result.output().len()),
        }
        result
    }

    /// Send an image prompt and return a displayable image reference.
    pub async fn generate_image(&self, prompt: &str) -> GenerationResult {
        let Some(provider) = self.image.as_ref() else {
            return GenerationResult::failure(GenerationError::Provider(
                "Image generation is not configured".to_string(),
            ));
        };

        log::info!(
            "Gateway: image request to {} ({} chars)",
            provider.name(),
            prompt.len()
        );

        let reply = match provider.render(prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("Gateway: image request failed: {:#}", e);
                return GenerationResult::failure(GenerationError::ImageTransport);
            }
        };

        let result = match resolve_image_reply(reply) {
            Ok(ResolvedImage::Reference(reference)) => GenerationResult::image(reference, None),
            Ok(ResolvedImage::Bytes(bytes)) => {
                match TransientImage::persist(&self.temp_dir, &bytes).await {
                    Ok(resource) => {
                        let reference = resource.reference().to_string();
                        GenerationResult::image(reference, Some(resource))
                    }
                    Err(e) => {
                        log::error!("Gateway: failed to store image: {:#}", e);
                        GenerationResult::failure(GenerationError::ImageTransport)
                    }
                }
            }
            Err(e) => GenerationResult::failure(e),
        };

        match result.error() {
            Some(e) => log::warn!("Gateway: image generation failed: {}", e),
            None => log::info!("Gateway: image ready"),
        }
        result
    }

    /// Fetch the bytes behind an image produced by this gateway.
    pub async fn load_image(&self, source: &ImageSource) -> Result<Vec<u8>> {
        resource::load_image(source, &self.http).await
    }
}

fn download_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(IMAGE_DOWNLOAD_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Failed to build image download client, using defaults: {}", e);
            reqwest::Client::new()
        })
}

/// Turn a text reply of any known shape into cleaned text or an error.
pub fn normalize_text_reply(reply: ProviderReply) -> GenerationResult {
    if let Some(message) = reply.error {
        return GenerationResult::failure(GenerationError::Provider(message));
    }

    let extracted = match reply.output {
        RawOutput::Json(value) => TextPayload::classify(&value).extract(),
        RawOutput::Binary(bytes) => String::from_utf8(bytes).ok(),
    };

    match extracted.map(|text| clean(&text)) {
        Some(text) if !text.is_empty() => GenerationResult::text(text),
        _ => GenerationResult::failure(GenerationError::EmptyText),
    }
}

fn resolve_image_reply(reply: ProviderReply) -> Result<ResolvedImage, GenerationError> {
    if let Some(message) = reply.error {
        return Err(GenerationError::Provider(message));
    }
    ImagePayload::classify(reply.output)
        .resolve()
        .ok_or(GenerationError::EmptyImage)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use anyhow::Result;

    use crate::providers::{ChatMessage, ImageProvider, ProviderReply, TextProvider};

    /// Canned provider reply; `Fault` becomes a transport error.
    #[derive(Clone)]
    pub enum Scripted {
        Reply(ProviderReply),
        Fault(&'static str),
    }

    /// In-process provider returning the same scripted reply to every call.
    /// Clones share their call log.
    #[derive(Clone)]
    pub struct FakeProvider {
        pub script: Scripted,
        pub calls: Arc<AtomicUsize>,
        pub last_messages: Arc<Mutex<Vec<ChatMessage>>>,
    }

    impl FakeProvider {
        pub fn new(script: Scripted) -> Self {
            Self {
                script,
                calls: Arc::new(AtomicUsize::new(0)),
                last_messages: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn answer(&self) -> Result<ProviderReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.script {
                Scripted::Reply(reply) => Ok(reply.clone()),
                Scripted::Fault(message) => Err(anyhow::anyhow!(*message)),
            }
        }
    }

    #[async_trait::async_trait]
    impl TextProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        async fn complete(&self, messages: &[ChatMessage]) -> Result<ProviderReply> {
            *self.last_messages.lock().unwrap() = messages.to_vec();
            self.answer()
        }
    }

    #[async_trait::async_trait]
    impl ImageProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        async fn render(&self, _prompt: &str) -> Result<ProviderReply> {
            self.answer()
        }
    }
}
