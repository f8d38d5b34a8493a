use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub text_model: ModelConfig,
    /// Image tools are disabled when absent.
    pub image_model: Option<ModelConfig>,
    pub output: OutputConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub temp_dir: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RevealConfig {
    pub enabled: bool,
    pub interval_ms: u64,
    pub chunk_chars: usize,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 700,
            chunk_chars: 120,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

fn default_temperature() -> f32 {
    0.7
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context("Failed to read config file. Make sure config.toml exists.")?;

        let mut config = Self::from_toml(&content)?;
        config.apply_env_overrides(
            std::env::var("TELOXIDE_TOKEN").ok(),
            std::env::var("BYTEZ_API_KEY").ok(),
        );

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Environment values win for the bot token and fill empty API keys.
    fn apply_env_overrides(&mut self, token: Option<String>, api_key: Option<String>) {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.telegram.bot_token = token;
        }

        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            for model in std::iter::once(&mut self.text_model).chain(self.image_model.as_mut()) {
                if model.api_key.is_empty() {
                    model.api_key = key.clone();
                }
            }
        }
    }

    /// Create output directories if they don't exist
    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output.temp_dir)
            .context("Failed to create temp directory")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [telegram]
        bot_token = "test_token"

        [text_model]
        provider = "bytez"
        model = "openai/gpt-4o"
        endpoint = "https://api.bytez.com/models/v2"
        api_key = ""
        temperature = 0.5

        [image_model]
        provider = "bytez"
        model = "stabilityai/stable-diffusion-xl-base-1.0"
        endpoint = "https://api.bytez.com/models/v2"
        api_key = "image-key"

        [output]
        temp_dir = "./temp"

        [reveal]
        enabled = false
        interval_ms = 250
        chunk_chars = 40

        [logging]
        level = "debug"
    "#;

    #[test]
    fn test_config_parsing() {
        let config = Config::from_toml(FULL).unwrap();
        assert_eq!(config.telegram.bot_token, "test_token");
        assert_eq!(config.text_model.model, "openai/gpt-4o");
        assert_eq!(config.text_model.temperature, 0.5);
        let image = config.image_model.unwrap();
        assert_eq!(image.temperature, 0.7);
        assert_eq!(image.api_key, "image-key");
        assert_eq!(
            config.reveal,
            RevealConfig { enabled: false, interval_ms: 250, chunk_chars: 40 }
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_optional_sections() {
        let toml_str = r#"
            [telegram]
            bot_token = "t"

            [text_model]
            provider = "ollama"
            model = "llama3"
            endpoint = "http://localhost:11434"

            [output]
            temp_dir = "./temp"

            [logging]
            level = "info"
        "#;

        let config = Config::from_toml(toml_str).unwrap();
        assert!(config.image_model.is_none());
        assert_eq!(config.reveal, RevealConfig::default());
        assert_eq!(config.text_model.api_key, "");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::from_toml(FULL).unwrap();
        config.apply_env_overrides(Some("env_token".to_string()), Some("env-key".to_string()));

        assert_eq!(config.telegram.bot_token, "env_token");
        assert_eq!(config.text_model.api_key, "env-key");
        // An explicit key in the file is kept
        assert_eq!(config.image_model.unwrap().api_key, "image-key");
    }

    #[test]
    fn test_missing_section_is_an_error() {
        assert!(Config::from_toml("[telegram]\nbot_token = \"t\"").is_err());
    }
}
