use chat_relay::{
    CompletionConfig, DEFAULT_COMPLETION_TIMEOUT_SECS, DEFAULT_COMPLETION_URL, DEFAULT_MODEL,
    DEFAULT_SESSION_KEY_PREFIX, DEFAULT_SESSION_TTL_SECS, PromptCase, RelayConfig, ResponseFormat,
    RuntimeSettings, SessionConfig,
};

use crate::cli::GatewayArgs;
use crate::resolve::{
    resolve_optional_string, resolve_parsed, resolve_positive_u64, resolve_string,
    resolve_ttl_secs,
};

/// Resolve relay config: CLI flag > env > settings.yaml > default.
pub(crate) fn build_relay_config(
    args: &GatewayArgs,
    runtime_settings: &RuntimeSettings,
) -> RelayConfig {
    let completion_settings = &runtime_settings.completion;
    let session_settings = &runtime_settings.session;
    let relay_settings = &runtime_settings.relay;

    let completion = CompletionConfig {
        url: resolve_string(
            args.completion_url.clone(),
            "CHAT_RELAY_COMPLETION_URL",
            completion_settings.url.as_deref(),
            DEFAULT_COMPLETION_URL,
        ),
        model: resolve_string(
            args.model.clone(),
            "CHAT_RELAY_MODEL",
            completion_settings.model.as_deref(),
            DEFAULT_MODEL,
        ),
        api_key: completion_settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(ToString::to_string),
        timeout_secs: resolve_positive_u64(
            args.completion_timeout,
            "CHAT_RELAY_COMPLETION_TIMEOUT_SECS",
            completion_settings.timeout_secs,
            DEFAULT_COMPLETION_TIMEOUT_SECS,
        ),
    };

    let session = SessionConfig {
        valkey_url: resolve_optional_string(
            args.valkey_url.clone(),
            "VALKEY_URL",
            session_settings.valkey_url.as_deref(),
        ),
        key_prefix: resolve_string(
            None,
            "CHAT_RELAY_SESSION_PREFIX",
            session_settings.key_prefix.as_deref(),
            DEFAULT_SESSION_KEY_PREFIX,
        ),
        ttl_secs: resolve_ttl_secs(
            "CHAT_RELAY_SESSION_TTL_SECS",
            session_settings.ttl_secs,
            DEFAULT_SESSION_TTL_SECS,
        ),
    };

    RelayConfig {
        completion,
        session,
        system_prompt: resolve_optional_string(
            None,
            "CHAT_RELAY_SYSTEM_PROMPT",
            relay_settings.system_prompt.as_deref(),
        ),
        prompt_case: resolve_parsed::<PromptCase>(
            "CHAT_RELAY_PROMPT_CASE",
            relay_settings.prompt_case.as_deref(),
            "relay.prompt_case",
        ),
        response_format: resolve_parsed::<ResponseFormat>(
            "CHAT_RELAY_RESPONSE_FORMAT",
            relay_settings.response_format.as_deref(),
            "relay.response_format",
        ),
    }
}
