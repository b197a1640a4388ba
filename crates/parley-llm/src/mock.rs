//! Mock Completion Service
//!
//! Used when the provider is `"mock"`. Returns deterministic responses that
//! reflect the context it was given, so history threading is observable.

use crate::{CompletionRequest, CompletionResponse, CompletionService, LlmError, LlmRole};

const MOCK_MODEL: &str = "mock-model";

/// Mock completion service for development and testing
#[derive(Debug, Clone, Default)]
pub struct MockCompletionService;

impl MockCompletionService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CompletionService for MockCompletionService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        tracing::debug!("Mock completion service processing request");

        let model = if request.model.is_empty() {
            MOCK_MODEL.to_string()
        } else {
            request.model
        };

        let last_message = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or("empty");

        let prior_user_turns = request
            .messages
            .iter()
            .rev()
            .skip(1)
            .filter(|m| m.role == LlmRole::User)
            .count();

        let content = format!(
            "Mock response to: {} (context: {} earlier user messages)",
            last_message, prior_user_turns
        );
        let input_tokens = request
            .messages
            .iter()
            .map(|m| m.content.len() as u32 / 4)
            .sum::<u32>();
        let output_tokens = content.len() as u32 / 4;

        Ok(CompletionResponse {
            content,
            model,
            input_tokens,
            output_tokens,
            finish_reason: "stop".to_string(),
        })
    }

    fn provider(&self) -> &'static str {
        "mock"
    }
}
