//! Request, response, and conversation types shared across the chat crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Intent
// =============================================================================

/// Category of a user message. Decides which responder answers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Weather,
    Translation,
    General,
}

impl Intent {
    pub const ALL: [Intent; 3] = [Intent::Weather, Intent::Translation, Intent::General];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Translation => "translation",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type` field of a successful response: the intent that answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Weather,
    Translation,
    General,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Translation => "translation",
            Self::General => "general",
        }
    }
}

impl From<Intent> for ResponseType {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::Weather => Self::Weather,
            Intent::Translation => Self::Translation,
            Intent::General => Self::General,
        }
    }
}

// =============================================================================
// Turns
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One role-tagged message within a conversation. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Per-session overview returned by the conversation listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub session_id: String,
    pub turn_count: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

// =============================================================================
// Request / response envelope
// =============================================================================

/// Inbound chat request as sent by callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Arbitrary caller fields. `user_id` and `session_id` are recognized.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.metadata
            .insert("session_id".to_string(), Value::String(session_id.into()));
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Model and sampling options resolved for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub model: String,
    pub temperature: f64,
}

/// Uniform response envelope returned for every successful request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Answer text.
    pub message: String,
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    /// Model that produced the answer; absent for locally answered intents.
    pub model_used: Option<String>,
    /// Wall-clock seconds from receipt to response.
    pub processing_time: f64,
    /// RFC 3339 timestamp of the response.
    pub timestamp: String,
    /// Session identifier, if the caller supplied one.
    pub conversation_id: Option<String>,
    pub metadata: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intent_serialization() {
        assert_eq!(serde_json::to_value(Intent::Weather).unwrap(), json!("weather"));
        assert_eq!(Intent::Translation.to_string(), "translation");
        assert_eq!(Intent::ALL.len(), 3);
    }

    #[test]
    fn test_response_type_from_intent() {
        for intent in Intent::ALL {
            let rt = ResponseType::from(intent);
            assert_eq!(serde_json::to_value(rt).unwrap(), json!(intent.as_str()));
            assert_eq!(rt.as_str(), intent.as_str());
        }
        // Failures are reported through the error body, never as a response type.
        assert!(serde_json::from_value::<ResponseType>(json!("error")).is_err());
    }

    #[test]
    fn test_chat_request_defaults() {
        let req: ChatRequest = serde_json::from_value(json!({"message": "hi"})).unwrap();
        assert_eq!(req.message, "hi");
        assert!(req.model.is_none());
        assert!(req.temperature.is_none());
        assert!(req.metadata.is_empty());
    }

    #[test]
    fn test_chat_request_builders() {
        let req = ChatRequest::new("hello")
            .with_session("s-1")
            .with_model("gpt-4")
            .with_temperature(0.1);
        assert_eq!(req.metadata["session_id"], json!("s-1"));
        assert_eq!(req.model.as_deref(), Some("gpt-4"));
        assert_eq!(req.temperature, Some(0.1));
    }

    #[test]
    fn test_turn_constructors() {
        let user = Turn::user("question");
        let assistant = Turn::assistant("answer");
        assert_eq!(user.role, Role::User);
        assert_eq!(assistant.role, Role::Assistant);
        assert!(assistant.timestamp >= user.timestamp);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_response_type_field_renamed() {
        let resp = ChatResponse {
            message: "ok".to_string(),
            response_type: ResponseType::General,
            model_used: Some("gpt-4".to_string()),
            processing_time: 0.01,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            conversation_id: None,
            metadata: Map::new(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["type"], "general");
        assert!(json["conversation_id"].is_null());
    }
}
