//! Conversational core for Parley.
//!
//! Classifies each incoming message into an intent, dispatches it to the
//! matching responder, and threads per-session conversation history
//! across requests.

pub mod classifier;
pub mod dispatcher;
pub mod error;
pub mod responder;
pub mod store;
pub mod types;

pub use classifier::IntentClassifier;
pub use dispatcher::{DispatchStage, Dispatcher};
pub use error::{ChatError, ErrorKind};
pub use responder::{Responder, ResponderOutput, ResponderSet};
pub use store::ConversationStore;
pub use types::{
    ChatRequest, ChatResponse, ConversationSummary, Intent, RequestOptions, ResponseType, Role,
    Turn,
};
