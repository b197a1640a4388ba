//! Request pipeline: validate, classify, answer, record, respond.
//!
//! Every request runs through the same stages:
//! `Received → Classified → Dispatched → Answered → HistoryUpdated → Responded`,
//! or ends in `Failed`. History is written only after an answer exists, and
//! both turns of an exchange are appended together, so a failed or cancelled
//! request leaves its session untouched.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use parley_core::config::ModelConfig;
use parley_core::ParleyConfig;
use parley_llm::CompletionService;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::classifier::IntentClassifier;
use crate::error::ChatError;
use crate::responder::{
    GeneralResponder, Language, ResponderSet, TranslationResponder, WeatherResponder,
};
use crate::store::ConversationStore;
use crate::types::{ChatRequest, ChatResponse, ConversationSummary, RequestOptions, Turn};

/// Pipeline position of a single request, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    Received,
    Classified,
    Dispatched,
    Answered,
    HistoryUpdated,
    Responded,
    Failed,
}

impl std::fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::Classified => "classified",
            Self::Dispatched => "dispatched",
            Self::Answered => "answered",
            Self::HistoryUpdated => "history_updated",
            Self::Responded => "responded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Routes each message to the responder for its intent and threads
/// per-session history across requests.
pub struct Dispatcher {
    classifier: IntentClassifier,
    responders: ResponderSet,
    store: Arc<ConversationStore>,
    model: ModelConfig,
}

impl Dispatcher {
    /// Build a dispatcher over an injected completion service and store.
    pub fn new(
        config: &ParleyConfig,
        service: Arc<dyn CompletionService>,
        store: Arc<ConversationStore>,
    ) -> Self {
        let fallback = Language::from_name(&config.translation.fallback_language)
            .unwrap_or_else(|| {
                tracing::warn!(
                    language = %config.translation.fallback_language,
                    "Unknown translation fallback language, using english"
                );
                Language::English
            });

        let responders = ResponderSet::new(
            WeatherResponder::new(),
            TranslationResponder::new(fallback),
            GeneralResponder::new(
                service,
                config.model.request_timeout(),
                config.model.history_window,
            ),
        );

        Self {
            classifier: IntentClassifier::new(),
            responders,
            store,
            model: config.model.clone(),
        }
    }

    /// Check a request and resolve its model and temperature.
    ///
    /// Runs before any pipeline stage; a rejected request never touches history.
    pub fn validate(&self, request: &ChatRequest) -> Result<RequestOptions, ChatError> {
        if request.message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if request.message.chars().count() > self.model.max_message_length {
            return Err(ChatError::MessageTooLong(self.model.max_message_length));
        }

        let temperature = request
            .temperature
            .unwrap_or(self.model.default_temperature);
        if !self.model.temperature_in_range(temperature) {
            return Err(ChatError::TemperatureOutOfRange {
                value: temperature,
                min: self.model.min_temperature,
                max: self.model.max_temperature,
            });
        }

        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.model.default_model.clone());
        if !self.model.is_supported(&model) {
            return Err(ChatError::UnsupportedModel(model));
        }

        metadata_str(&request.metadata, "session_id")?;
        metadata_str(&request.metadata, "user_id")?;

        Ok(RequestOptions { model, temperature })
    }

    /// Run one request through the pipeline.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let started = Instant::now();
        let options = self.validate(&request)?;
        let session_id = metadata_str(&request.metadata, "session_id")?
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);
        // Stamped on receipt, not when the answer arrives.
        let user_turn = Turn::user(request.message.clone());
        tracing::debug!(
            stage = %DispatchStage::Received,
            session_id = ?session_id,
            message = %request.message,
            "Chat request received"
        );

        let intent = self.classifier.classify(&request.message);
        tracing::debug!(stage = %DispatchStage::Classified, %intent, "Message classified");

        let history = match &session_id {
            Some(id) => self.store.get(id)?,
            None => Vec::new(),
        };
        let responder = self.responders.select(intent);
        tracing::debug!(
            stage = %DispatchStage::Dispatched,
            %intent,
            history_turns = history.len(),
            "Responder selected"
        );

        let output = match responder
            .respond(&request.message, &history, &options)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(
                    stage = %DispatchStage::Failed,
                    %intent,
                    session_id = ?session_id,
                    kind = e.kind().as_str(),
                    "Responder failed: {}",
                    e
                );
                return Err(e);
            }
        };
        tracing::debug!(stage = %DispatchStage::Answered, %intent, "Answer produced");

        let turn_count = match &session_id {
            Some(id) => {
                let count = self.store.append_exchange(
                    id,
                    user_turn,
                    Turn::assistant(output.answer.clone()),
                )?;
                tracing::debug!(
                    stage = %DispatchStage::HistoryUpdated,
                    session_id = %id,
                    turn_count = count,
                    "History updated"
                );
                count
            }
            None => 0,
        };

        let user_id = metadata_str(&request.metadata, "user_id")?
            .map(str::to_string)
            .unwrap_or_else(anonymous_user_id);

        let mut metadata = request.metadata;
        metadata.insert("user_id".to_string(), Value::String(user_id));
        metadata.insert("temperature".to_string(), json!(options.temperature));
        metadata.insert("turn_count".to_string(), json!(turn_count));
        metadata.extend(output.metadata);

        let processing_time = started.elapsed().as_secs_f64();
        tracing::info!(
            stage = %DispatchStage::Responded,
            %intent,
            session_id = ?session_id,
            elapsed_ms = (processing_time * 1000.0) as u64,
            "Chat request handled"
        );

        Ok(ChatResponse {
            message: output.answer,
            response_type: intent.into(),
            model_used: output.model_used,
            processing_time,
            timestamp: Utc::now().to_rfc3339(),
            conversation_id: session_id,
            metadata,
        })
    }

    /// Stored turns for `session_id`, oldest first; empty if unseen.
    pub fn history(&self, session_id: &str) -> Result<Vec<Turn>, ChatError> {
        self.store.get(session_id)
    }

    pub fn conversations(&self) -> Result<Vec<ConversationSummary>, ChatError> {
        self.store.summaries()
    }

    pub fn supported_models(&self) -> &[String] {
        &self.model.supported_models
    }

    pub fn default_model(&self) -> &str {
        &self.model.default_model
    }
}

/// Read an optional string field from caller metadata.
fn metadata_str<'a>(
    metadata: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a str>, ChatError> {
    match metadata.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ChatError::InvalidMetadata(format!("{} must be a string", key))),
    }
}

fn anonymous_user_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("anonymous_{}", &id[..8])
}
