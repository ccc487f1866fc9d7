use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chat-relay")]
#[command(about = "HTTP chat relay: session history in Valkey, replies from an OpenAI-compatible API.")]
pub(crate) struct Cli {
    /// Override config directory (user settings live at `<conf>/chat-relay/settings.yaml`).
    #[arg(long, global = true)]
    pub(crate) conf: Option<PathBuf>,

    /// Debug-level logs (ignored when RUST_LOG is set).
    #[arg(long, short = 'v', global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct GatewayArgs {
    /// Listen address (default: 0.0.0.0:8080; or CHAT_RELAY_BIND)
    #[arg(long)]
    pub(crate) bind: Option<String>,

    /// Completion model id (default: gpt-5; or CHAT_RELAY_MODEL)
    #[arg(long)]
    pub(crate) model: Option<String>,

    /// Chat completions endpoint (or CHAT_RELAY_COMPLETION_URL)
    #[arg(long)]
    pub(crate) completion_url: Option<String>,

    /// Outbound completion timeout in seconds (default: 15)
    #[arg(long)]
    pub(crate) completion_timeout: Option<u64>,

    /// Valkey URL for session history (or VALKEY_URL); omitted = in-memory store
    #[arg(long)]
    pub(crate) valkey_url: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run HTTP server (POST /chat). Default bind: 0.0.0.0:8080
    Gateway(GatewayArgs),
}
