//! Parley application binary - composition root.
//!
//! 1. Parse CLI arguments and load `.env`
//! 2. Load configuration from TOML and apply CLI/env overrides
//! 3. Initialize tracing
//! 4. Build the completion service
//! 5. Run the HTTP API server, or the interactive REPL

mod cli;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use parley_api::{routes, AppState};
use parley_chat::{ChatRequest, ConversationStore, Dispatcher};
use parley_core::config::LlmProvider;
use parley_core::ParleyConfig;
use parley_llm::{CompletionService, CompletionServiceFactory, MockCompletionService};

use cli::{CliArgs, Command};

/// Install the global subscriber.
///
/// Priority: RUST_LOG > --log-level > config `general.log_level`.
fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

/// Build the completion service, falling back to the mock when the OpenAI
/// provider has no API key.
fn completion_service(config: &ParleyConfig) -> Arc<dyn CompletionService> {
    if config.llm.provider == LlmProvider::OpenAi
        && config.llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
    {
        tracing::warn!("OPENAI_API_KEY is not set; general questions will use the mock provider");
        return Arc::new(MockCompletionService::new());
    }

    match CompletionServiceFactory::create(&config.llm) {
        Ok(service) => service,
        Err(e) => {
            tracing::warn!(error = %e, "Completion service unavailable; using the mock provider");
            Arc::new(MockCompletionService::new())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

async fn serve(
    config: ParleyConfig,
    service: Arc<dyn CompletionService>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(config, service);
    tracing::info!(
        "Endpoints: POST /chat, GET /conversations, GET /models, GET /health on http://{}:{}",
        state.config.server.host,
        state.config.server.port
    );
    routes::start_server(state, shutdown_signal()).await?;
    Ok(())
}

/// Read messages from stdin and answer them in one session until `exit`.
async fn repl(
    config: ParleyConfig,
    service: Arc<dyn CompletionService>,
) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = Dispatcher::new(&config, service, Arc::new(ConversationStore::new()));
    let session_id = format!("repl-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(b"Parley interactive mode. Type 'exit' to quit.\n> ")
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let message = line.trim();
        if matches!(message, "exit" | "quit") {
            break;
        }
        if !message.is_empty() {
            let request = ChatRequest::new(message).with_session(session_id.as_str());
            let output = match dispatcher.handle(request).await {
                Ok(resp) => format!("[{}] {}\n", resp.response_type.as_str(), resp.message),
                Err(e) => format!("[error: {}] {}\n", e.kind().as_str(), e),
            };
            stdout.write_all(output.as_bytes()).await?;
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    let turns = dispatcher.history(&session_id)?.len();
    tracing::info!(session_id = %session_id, turns, "Interactive session ended");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = CliArgs::parse();

    // Config is read before tracing so its log level can apply.
    let config_file = args.resolve_config_path();
    let loaded = config_file
        .exists()
        .then(|| ParleyConfig::load(&config_file));

    let config_level = match &loaded {
        Some(Ok(config)) => config.general.log_level.clone(),
        _ => "info".to_string(),
    };
    let level = args.resolve_log_level().unwrap_or(config_level);
    init_tracing(&level);

    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Some(Ok(config)) => {
            tracing::info!(path = %config_file.display(), "Configuration loaded");
            config
        }
        Some(Err(e)) => {
            tracing::error!(path = %config_file.display(), error = %e, "Invalid configuration");
            return Err(e.into());
        }
        None => {
            tracing::info!(path = %config_file.display(), "No configuration file; using defaults");
            ParleyConfig::default()
        }
    };

    config.general.log_level = level;
    config.server.port = args.resolve_port(config.server.port);
    config.server.host = args.resolve_host(&config.server.host);
    config.llm.provider = args.resolve_provider(config.llm.provider);
    config.llm.api_key = cli::resolve_api_key(config.llm.api_key.take());

    let service = completion_service(&config);
    tracing::info!(provider = service.provider(), "Completion service ready");

    match args.command() {
        Command::Serve => serve(config, service).await,
        Command::Repl => repl(config, service).await,
    }
}
