//! Completion service for Parley.
//!
//! Defines the opaque "generate completion" capability used by the general
//! responder, an OpenAI-compatible HTTP implementation, and a deterministic
//! mock. Callers depend only on [`CompletionService`].

pub mod mock;
pub mod openai;

use std::sync::Arc;

use parley_core::config::{LlmConfig, LlmProvider};
use serde::{Deserialize, Serialize};

pub use mock::MockCompletionService;
pub use openai::OpenAiService;

/// Speaker of a message replayed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    User,
    Assistant,
}

impl LlmRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message in the ordered context sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::Assistant,
            content: content.into(),
        }
    }
}

/// Input to a single completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier. Empty means the service default.
    pub model: String,
    pub temperature: f64,
    /// Conversation so far, oldest first, ending with the current user message.
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
}

/// Output of a single completion call.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    /// Model that actually produced the answer, as reported by the provider.
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub finish_reason: String,
}

/// Failures of the external completion capability.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response: {0}")]
    Response(String),
    #[error("rate limit exceeded")]
    RateLimit,
    #[error("service not configured: {0}")]
    NotConfigured(String),
}

/// The "generate completion" capability.
///
/// Implementations must not retry on their own; retry is a caller concern.
#[async_trait::async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Short provider name for logs.
    fn provider(&self) -> &'static str;
}

/// Builds the configured [`CompletionService`].
pub struct CompletionServiceFactory;

impl CompletionServiceFactory {
    /// Create a service for `config.provider`.
    ///
    /// The OpenAI provider requires an API key.
    pub fn create(config: &LlmConfig) -> Result<Arc<dyn CompletionService>, LlmError> {
        match config.provider {
            LlmProvider::Mock => {
                tracing::info!("Using mock completion service");
                Ok(Arc::new(MockCompletionService::new()))
            }
            LlmProvider::OpenAi => {
                let api_key = config
                    .api_key
                    .clone()
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| {
                        LlmError::NotConfigured("OpenAI API key is missing".to_string())
                    })?;
                tracing::info!(base_url = ?config.base_url, "Using OpenAI completion service");
                Ok(Arc::new(OpenAiService::new(api_key, config.base_url.clone())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creates_mock() {
        let config = LlmConfig {
            provider: LlmProvider::Mock,
            ..LlmConfig::default()
        };
        let service = CompletionServiceFactory::create(&config).unwrap();
        assert_eq!(service.provider(), "mock");
    }

    #[test]
    fn test_factory_openai_requires_key() {
        let config = LlmConfig::default();
        let result = CompletionServiceFactory::create(&config);
        assert!(matches!(result, Err(LlmError::NotConfigured(_))));

        let config = LlmConfig {
            api_key: Some("   ".to_string()),
            ..LlmConfig::default()
        };
        assert!(CompletionServiceFactory::create(&config).is_err());
    }

    #[test]
    fn test_factory_creates_openai() {
        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        };
        let service = CompletionServiceFactory::create(&config).unwrap();
        assert_eq!(service.provider(), "openai");
    }

    #[test]
    fn test_llm_error_display() {
        assert_eq!(LlmError::RateLimit.to_string(), "rate limit exceeded");
        assert_eq!(
            LlmError::Request("connection refused".to_string()).to_string(),
            "request failed: connection refused"
        );
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&LlmMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
        assert_eq!(LlmRole::User.as_str(), "user");
    }
}
