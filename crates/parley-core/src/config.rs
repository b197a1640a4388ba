use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ParleyError, Result};

/// Top-level configuration for the Parley service.
///
/// Loaded from `parley.toml` (or the path given on the command line). Every
/// section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
}

impl ParleyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParleyConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        let model = &self.model;
        if model.supported_models.is_empty() {
            return Err(ParleyError::Config(
                "model.supported_models must not be empty".to_string(),
            ));
        }
        if !model.supported_models.contains(&model.default_model) {
            return Err(ParleyError::Config(format!(
                "model.default_model '{}' is not in model.supported_models",
                model.default_model
            )));
        }
        if model.min_temperature > model.max_temperature {
            return Err(ParleyError::Config(format!(
                "model.min_temperature ({}) exceeds model.max_temperature ({})",
                model.min_temperature, model.max_temperature
            )));
        }
        if !model.temperature_in_range(model.default_temperature) {
            return Err(ParleyError::Config(format!(
                "model.default_temperature {} is outside [{}, {}]",
                model.default_temperature, model.min_temperature, model.max_temperature
            )));
        }
        if model.request_timeout_secs == 0 {
            return Err(ParleyError::Config(
                "model.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if model.max_message_length == 0 {
            return Err(ParleyError::Config(
                "model.max_message_length must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Model selection, sampling defaults, and per-request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model used when a request does not name one.
    pub default_model: String,
    /// Models a caller may request. Anything else is rejected.
    pub supported_models: Vec<String>,
    /// Temperature used when a request does not supply one.
    pub default_temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    /// Upper bound on a single completion call.
    pub request_timeout_secs: u64,
    /// Number of most recent user/assistant exchanges replayed to the model.
    pub history_window: usize,
    /// Maximum message length in characters.
    pub max_message_length: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_model: "gpt-4o-mini".to_string(),
            supported_models: vec![
                "gpt-4o-mini".to_string(),
                "gpt-4".to_string(),
                "gpt-3.5-turbo".to_string(),
            ],
            default_temperature: 0.7,
            min_temperature: 0.0,
            max_temperature: 2.0,
            request_timeout_secs: 30,
            history_window: 10,
            max_message_length: 4000,
        }
    }
}

impl ModelConfig {
    /// Whether `value` lies within the configured inclusive temperature range.
    ///
    /// NaN is never in range.
    pub fn temperature_in_range(&self, value: f64) -> bool {
        value >= self.min_temperature && value <= self.max_temperature
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn is_supported(&self, model: &str) -> bool {
        self.supported_models.iter().any(|m| m == model)
    }
}

/// Which completion backend answers general questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions endpoint.
    #[serde(rename = "openai")]
    OpenAi,
    /// Deterministic in-process responder for development and tests.
    #[serde(rename = "mock")]
    Mock,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            other => Err(ParleyError::Config(format!("unknown LLM provider: {}", other))),
        }
    }
}

/// Completion backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Override for the provider's base URL (e.g. a local proxy).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// API key. Usually supplied through `OPENAI_API_KEY` instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            base_url: None,
            api_key: None,
        }
    }
}

/// Translation responder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Target language assumed when a request names none.
    pub fallback_language: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            fallback_language: "english".to_string(),
        }
    }
}
