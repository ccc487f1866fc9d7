use std::str::FromStr;

pub(crate) fn resolve_string(
    cli_value: Option<String>,
    env_name: &str,
    settings_value: Option<&str>,
    default: &str,
) -> String {
    if let Some(value) = cli_value {
        return value;
    }
    if let Ok(value) = std::env::var(env_name)
        && !value.trim().is_empty()
    {
        return value;
    }
    if let Some(value) = settings_value {
        return value.to_string();
    }
    default.to_string()
}

pub(crate) fn resolve_optional_string(
    cli_value: Option<String>,
    env_name: &str,
    settings_value: Option<&str>,
) -> Option<String> {
    if cli_value.is_some() {
        return cli_value;
    }
    if let Ok(value) = std::env::var(env_name)
        && !value.trim().is_empty()
    {
        return Some(value);
    }
    settings_value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn resolve_positive_u64(
    cli_value: Option<u64>,
    env_name: &str,
    settings_value: Option<u64>,
    default: u64,
) -> u64 {
    if let Some(value) = cli_value
        && value > 0
    {
        return value;
    }
    if let Some(value) = parse_positive_u64_from_env(env_name) {
        return value;
    }
    if let Some(value) = settings_value
        && value > 0
    {
        return value;
    }
    default
}

/// TTL where `0` is meaningful: it disables expiry.
pub(crate) fn resolve_ttl_secs(
    env_name: &str,
    settings_value: Option<u64>,
    default: u64,
) -> Option<u64> {
    let resolved = match std::env::var(env_name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(
                    env_var = env_name,
                    value = %raw,
                    "invalid session ttl env value; using settings/default"
                );
                settings_value.unwrap_or(default)
            }
        },
        Err(_) => settings_value.unwrap_or(default),
    };
    (resolved > 0).then_some(resolved)
}

/// Parse an enum from env, then settings; invalid values are logged and skipped.
pub(crate) fn resolve_parsed<T>(env_name: &str, settings_value: Option<&str>, source: &str) -> T
where
    T: FromStr<Err = anyhow::Error> + Default,
{
    if let Ok(raw) = std::env::var(env_name)
        && !raw.trim().is_empty()
    {
        match raw.parse::<T>() {
            Ok(value) => return value,
            Err(error) => {
                tracing::warn!(env_var = env_name, error = %error, "invalid env value; using settings/default");
            }
        }
    }
    if let Some(raw) = settings_value {
        match raw.parse::<T>() {
            Ok(value) => return value,
            Err(error) => {
                tracing::warn!(source, error = %error, "invalid settings value; using default");
            }
        }
    }
    T::default()
}

pub(crate) fn parse_positive_u64_from_env(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            tracing::warn!(env_var = %name, value = %raw, "invalid positive integer env value");
            None
        }
    }
}
