//! OpenAI-compatible chat completions client.
//!
//! Calls `{base_url}/v1/chat/completions` with reqwest. Works against the
//! OpenAI API and any server exposing the same wire format.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{CompletionRequest, CompletionResponse, CompletionService, LlmError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Chat completions request body
#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: Vec<MessageBody<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat completions response body
#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// API error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    message: String,
}

/// OpenAI completion service implementation
pub struct OpenAiService {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiService {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait::async_trait]
impl CompletionService for OpenAiService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if request.model.is_empty() {
            return Err(LlmError::Request("model identifier is required".to_string()));
        }

        let body = ChatCompletionsRequest {
            model: &request.model,
            temperature: request.temperature,
            messages: request
                .messages
                .iter()
                .map(|m| MessageBody {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: request.max_tokens,
        };

        tracing::debug!(
            model = %request.model,
            temperature = request.temperature,
            messages = request.messages.len(),
            "Sending chat completions request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Request(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimit);
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_body) {
                return Err(LlmError::Response(format!(
                    "OpenAI API error ({}): {}",
                    error_response
                        .error
                        .error_type
                        .as_deref()
                        .unwrap_or("unknown"),
                    error_response.error.message
                )));
            }

            return Err(LlmError::Response(format!(
                "OpenAI API returned {}: {}",
                status, error_body
            )));
        }

        let api_response: ChatCompletionsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Response(format!("Failed to parse response: {}", e)))?;

        parse_completion(api_response)
    }

    fn provider(&self) -> &'static str {
        "openai"
    }
}

fn parse_completion(api_response: ChatCompletionsResponse) -> Result<CompletionResponse, LlmError> {
    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Response("response contained no choices".to_string()))?;

    let (input_tokens, output_tokens) = api_response
        .usage
        .map(|u| (u.prompt_tokens, u.completion_tokens))
        .unwrap_or((0, 0));

    Ok(CompletionResponse {
        content: choice.message.content.unwrap_or_default(),
        model: api_response.model,
        input_tokens,
        output_tokens,
        finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
    })
}
