//! Error types for the conversational core.

use parley_llm::LlmError;

/// Failure class surfaced to callers so they can decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request. Retrying unchanged will fail again.
    Validation,
    /// The completion service failed or timed out.
    ExternalCall,
    /// Unexpected fault inside the service.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::ExternalCall => "external_call",
            Self::Internal => "internal",
        }
    }
}

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("temperature {value} is outside the allowed range [{min}, {max}]")]
    TemperatureOutOfRange { value: f64, min: f64, max: f64 },
    #[error("unsupported model: {0}")]
    UnsupportedModel(String),
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("LLM call timed out after {0} seconds")]
    Timeout(u64),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyMessage
            | Self::MessageTooLong(_)
            | Self::TemperatureOutOfRange { .. }
            | Self::UnsupportedModel(_)
            | Self::InvalidMetadata(_) => ErrorKind::Validation,
            Self::Llm(_) | Self::Timeout(_) => ErrorKind::ExternalCall,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(4000).to_string(),
            "message exceeds maximum length of 4000 characters"
        );
        assert_eq!(
            ChatError::TemperatureOutOfRange {
                value: 3.5,
                min: 0.0,
                max: 2.0
            }
            .to_string(),
            "temperature 3.5 is outside the allowed range [0, 2]"
        );
        assert_eq!(
            ChatError::UnsupportedModel("gpt-9".to_string()).to_string(),
            "unsupported model: gpt-9"
        );
        assert_eq!(
            ChatError::Timeout(30).to_string(),
            "LLM call timed out after 30 seconds"
        );
    }

    #[test]
    fn test_chat_error_from_llm_error() {
        let err: ChatError = LlmError::RateLimit.into();
        assert!(matches!(err, ChatError::Llm(LlmError::RateLimit)));
        assert_eq!(err.to_string(), "LLM error: rate limit exceeded");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ChatError::EmptyMessage.kind(), ErrorKind::Validation);
        assert_eq!(ChatError::MessageTooLong(1).kind(), ErrorKind::Validation);
        assert_eq!(
            ChatError::InvalidMetadata("x".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(ChatError::Timeout(1).kind(), ErrorKind::ExternalCall);
        assert_eq!(
            ChatError::Llm(LlmError::Request("down".to_string())).kind(),
            ErrorKind::ExternalCall
        );
        assert_eq!(
            ChatError::Internal("bug".to_string()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(ErrorKind::Validation.as_str(), "validation");
        assert_eq!(ErrorKind::ExternalCall.as_str(), "external_call");
        assert_eq!(ErrorKind::Internal.as_str(), "internal");
    }
}
