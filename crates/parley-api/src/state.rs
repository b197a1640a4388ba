//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use parley_chat::{ConversationStore, Dispatcher};
use parley_core::ParleyConfig;
use parley_llm::CompletionService;

/// Shared application state, passed to handlers via axum's State extractor.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Request pipeline; owns the responders and the conversation store.
    pub dispatcher: Arc<Dispatcher>,
    /// Configuration the server was started with. Read-only.
    pub config: Arc<ParleyConfig>,
    /// Provider name of the completion service, for the health check.
    pub provider: &'static str,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Wire a dispatcher over `service` with a fresh conversation store.
    pub fn new(config: ParleyConfig, service: Arc<dyn CompletionService>) -> Self {
        let provider = service.provider();
        let store = Arc::new(ConversationStore::new());
        let dispatcher = Dispatcher::new(&config, service, store);
        Self {
            dispatcher: Arc::new(dispatcher),
            config: Arc::new(config),
            provider,
            start_time: Instant::now(),
        }
    }
}
