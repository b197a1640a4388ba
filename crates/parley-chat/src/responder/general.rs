//! General responder: the only path that calls the completion service.

use std::sync::Arc;
use std::time::Duration;

use parley_llm::{CompletionRequest, CompletionService, LlmMessage};
use serde_json::json;

use super::ResponderOutput;
use crate::error::ChatError;
use crate::types::{RequestOptions, Role, Turn};

pub struct GeneralResponder {
    service: Arc<dyn CompletionService>,
    timeout: Duration,
    /// Exchanges (user + assistant pairs) replayed to the model.
    history_window: usize,
}

impl GeneralResponder {
    pub fn new(
        service: Arc<dyn CompletionService>,
        timeout: Duration,
        history_window: usize,
    ) -> Self {
        Self {
            service,
            timeout,
            history_window,
        }
    }

    /// Ask the completion service, replaying recent history before `message`.
    ///
    /// The call is bounded by the configured timeout. Nothing is retried.
    pub async fn respond(
        &self,
        message: &str,
        history: &[Turn],
        options: &RequestOptions,
    ) -> Result<ResponderOutput, ChatError> {
        let replay = recent_turns(history, self.history_window);
        let mut messages: Vec<LlmMessage> = replay
            .iter()
            .map(|turn| match turn.role {
                Role::User => LlmMessage::user(turn.content.clone()),
                Role::Assistant => LlmMessage::assistant(turn.content.clone()),
            })
            .collect();
        messages.push(LlmMessage::user(message));

        let request = CompletionRequest {
            model: options.model.clone(),
            temperature: options.temperature,
            messages,
            max_tokens: None,
        };

        tracing::debug!(
            provider = self.service.provider(),
            model = %options.model,
            history_turns = replay.len(),
            "Calling completion service"
        );

        let call = self.service.complete(request);
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "Completion service timed out"
                );
                return Err(ChatError::Timeout(self.timeout.as_secs()));
            }
        };

        let model_used = if response.model.is_empty() {
            options.model.clone()
        } else {
            response.model
        };

        let mut metadata = serde_json::Map::new();
        metadata.insert("history_turns_used".to_string(), json!(replay.len()));
        metadata.insert("input_tokens".to_string(), json!(response.input_tokens));
        metadata.insert("output_tokens".to_string(), json!(response.output_tokens));
        metadata.insert("finish_reason".to_string(), json!(response.finish_reason));

        Ok(ResponderOutput {
            answer: response.content,
            model_used: Some(model_used),
            metadata,
        })
    }
}

/// The last `window` exchanges of `history`.
fn recent_turns(history: &[Turn], window: usize) -> &[Turn] {
    let keep = window.saturating_mul(2);
    &history[history.len().saturating_sub(keep)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_llm::{CompletionResponse, LlmError, LlmRole, MockCompletionService};
    use std::sync::Mutex;

    struct RecordingService {
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait::async_trait]
    impl CompletionService for RecordingService {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(CompletionResponse {
                content: "recorded".to_string(),
                model: String::new(),
                input_tokens: 3,
                output_tokens: 1,
                finish_reason: "stop".to_string(),
            })
        }

        fn provider(&self) -> &'static str {
            "recording"
        }
    }

    struct FailingService;

    #[async_trait::async_trait]
    impl CompletionService for FailingService {
        async fn complete(&self, _: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            Err(LlmError::Request("connection refused".to_string()))
        }

        fn provider(&self) -> &'static str {
            "failing"
        }
    }

    struct SlowService;

    #[async_trait::async_trait]
    impl CompletionService for SlowService {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            MockCompletionService::new().complete(request).await
        }

        fn provider(&self) -> &'static str {
            "slow"
        }
    }

    fn options() -> RequestOptions {
        RequestOptions {
            model: "gpt-4".to_string(),
            temperature: 0.2,
        }
    }

    fn history(exchanges: usize) -> Vec<Turn> {
        (0..exchanges)
            .flat_map(|i| [Turn::user(format!("q{}", i)), Turn::assistant(format!("a{}", i))])
            .collect()
    }

    #[tokio::test]
    async fn test_replays_history_in_order() {
        let service = Arc::new(RecordingService {
            seen: Mutex::new(Vec::new()),
        });
        let responder = GeneralResponder::new(service.clone(), Duration::from_secs(5), 10);

        let out = responder
            .respond("what is my name?", &history(2), &options())
            .await
            .unwrap();

        let seen = service.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.temperature, 0.2);
        let contents: Vec<&str> = request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["q0", "a0", "q1", "a1", "what is my name?"]);
        assert_eq!(request.messages[1].role, LlmRole::Assistant);

        // Empty provider model falls back to the requested one.
        assert_eq!(out.model_used.as_deref(), Some("gpt-4"));
        assert_eq!(out.metadata["history_turns_used"], 4);
        assert_eq!(out.metadata["finish_reason"], "stop");
    }

    #[tokio::test]
    async fn test_history_window_limits_replay() {
        let service = Arc::new(RecordingService {
            seen: Mutex::new(Vec::new()),
        });
        let responder = GeneralResponder::new(service.clone(), Duration::from_secs(5), 2);

        responder.respond("next", &history(5), &options()).await.unwrap();

        let seen = service.seen.lock().unwrap();
        let contents: Vec<&str> = seen[0].messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["q3", "a3", "q4", "a4", "next"]);
    }

    #[tokio::test]
    async fn test_service_failure_is_external() {
        let responder = GeneralResponder::new(Arc::new(FailingService), Duration::from_secs(5), 10);
        let err = responder.respond("hi", &[], &options()).await.unwrap_err();
        assert!(matches!(err, ChatError::Llm(LlmError::Request(_))));
        assert_eq!(err.kind(), crate::error::ErrorKind::ExternalCall);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let responder = GeneralResponder::new(Arc::new(SlowService), Duration::from_secs(30), 10);
        let err = responder.respond("hi", &[], &options()).await.unwrap_err();
        assert!(matches!(err, ChatError::Timeout(30)));
    }

    #[test]
    fn test_recent_turns() {
        let turns = history(3);
        assert_eq!(recent_turns(&turns, 10).len(), 6);
        assert_eq!(recent_turns(&turns, 1)[0].content, "q2");
        assert!(recent_turns(&turns, 0).is_empty());
    }
}
