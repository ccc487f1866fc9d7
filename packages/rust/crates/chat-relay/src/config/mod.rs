//! Config namespace: relay config types and YAML runtime settings.

mod relay;
mod settings;

pub use relay::{
    CompletionConfig, DEFAULT_COMPLETION_TIMEOUT_SECS, DEFAULT_COMPLETION_URL, DEFAULT_MODEL,
    PromptCase, RelayConfig, ResponseFormat, SessionConfig,
};
pub use settings::{
    CompletionSettings, GatewaySettings, RelaySettings, RuntimeSettings, SessionSettings,
    load_runtime_settings, load_runtime_settings_from_paths, runtime_settings_paths,
    set_config_home_override,
};
