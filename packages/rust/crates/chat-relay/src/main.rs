//! chat-relay CLI: HTTP gateway.
//!
//! Logging: set `RUST_LOG=chat_relay=info` (or `warn`, `debug`) to see relay logs on stderr.

mod cli;
mod nodes;
mod relay_builder;
mod resolve;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use chat_relay::{load_runtime_settings, set_config_home_override};

use crate::cli::{Cli, Command};
use crate::nodes::run_gateway_mode;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(conf_dir) = cli.conf.clone() {
        set_config_home_override(conf_dir);
    }

    // RUST_LOG overrides; --verbose => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "chat_relay=debug"
        } else {
            "chat_relay=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let runtime_settings = load_runtime_settings();

    match cli.command {
        Command::Gateway(args) => run_gateway_mode(args, &runtime_settings).await,
    }
}
