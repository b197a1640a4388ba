//! CLI argument definitions for the Parley application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use parley_core::config::LlmProvider;
use std::path::PathBuf;

/// Parley: an intent-routing chat service with per-session memory.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port", global = true)]
    pub port: Option<u16>,

    /// API server bind address.
    #[arg(long = "host", global = true)]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Completion provider (openai, mock).
    #[arg(long = "provider", global = true)]
    pub provider: Option<LlmProvider>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API server (default).
    Serve,
    /// Chat on stdin/stdout in a single session.
    Repl,
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PARLEY_CONFIG env var > ./parley.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        pick(self.config.clone(), env_var("PARLEY_CONFIG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("parley.toml"))
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > PARLEY_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        let env_port = env_var("PARLEY_PORT").and_then(|v| v.parse::<u16>().ok());
        pick(self.port, env_port).unwrap_or(config_port)
    }

    /// Resolve the API server bind address.
    ///
    /// Priority: --host flag > PARLEY_HOST env var > config file value.
    pub fn resolve_host(&self, config_host: &str) -> String {
        pick(self.host.clone(), env_var("PARLEY_HOST")).unwrap_or_else(|| config_host.to_string())
    }

    /// Resolve the completion provider.
    ///
    /// Priority: --provider flag > PARLEY_LLM_PROVIDER env var > config file value.
    /// An unparseable env value is ignored.
    pub fn resolve_provider(&self, config_provider: LlmProvider) -> LlmProvider {
        let env_provider = env_var("PARLEY_LLM_PROVIDER").and_then(|v| v.parse().ok());
        pick(self.provider, env_provider).unwrap_or(config_provider)
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    /// Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// Resolve the API key: OPENAI_API_KEY env var > config file value.
pub fn resolve_api_key(config_key: Option<String>) -> Option<String> {
    pick(env_var("OPENAI_API_KEY"), config_key)
}

/// First present value wins.
fn pick<T>(first: Option<T>, second: Option<T>) -> Option<T> {
    first.or(second)
}

/// Non-empty environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
