use chat_relay::{Relay, RuntimeSettings, run_http};

use crate::cli::GatewayArgs;
use crate::relay_builder::build_relay_config;
use crate::resolve::resolve_string;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

pub(crate) async fn run_gateway_mode(
    args: GatewayArgs,
    runtime_settings: &RuntimeSettings,
) -> anyhow::Result<()> {
    let config = build_relay_config(&args, runtime_settings);
    let bind_addr = resolve_string(
        args.bind,
        "CHAT_RELAY_BIND",
        runtime_settings.gateway.bind.as_deref(),
        DEFAULT_BIND,
    );
    let relay = Relay::from_config(&config)?;
    run_http(relay, &bind_addr).await
}
