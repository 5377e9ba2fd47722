//! Environment variable parsing with warn-level logging for invalid values.

use std::str::FromStr;

/// Parse an environment variable with a default fallback.
///
/// - Unset or blank: returns `default` silently.
/// - Set but unparsable: logs a warning and returns `default`.
pub fn env_parse_with_default<T: FromStr + std::fmt::Display>(var: &str, default: T) -> T {
    let Some(raw) = env_non_empty(var) else {
        return default;
    };
    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(var, value = %raw, default = %default, "invalid env var value, using default");
            default
        },
    }
}

/// Read an environment variable, treating blank values as unset.
#[must_use]
pub fn env_non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}
