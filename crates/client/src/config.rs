use std::time::Duration;

use mailtriage_core::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_PAGE_SIZE, MAX_LIST_LIMIT, env_parse_with_default,
};

use crate::refresh::RefreshConfig;

/// Client settings. `from_env` reads `MAILTRIAGE_*` variables and falls
/// back to defaults on anything unparsable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub page_size: u32,
    pub fetch_timeout: Duration,
    pub refresh: RefreshConfig,
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            page_size: DEFAULT_PAGE_SIZE,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            refresh: RefreshConfig::default(),
        }
    }

    #[must_use]
    pub fn from_env(base_url: impl Into<String>) -> Self {
        let page_size = env_parse_with_default("MAILTRIAGE_PAGE_SIZE", DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_LIST_LIMIT);
        let fetch_timeout =
            env_parse_with_default("MAILTRIAGE_FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS);
        Self {
            base_url: base_url.into(),
            page_size,
            fetch_timeout: Duration::from_secs(fetch_timeout),
            refresh: RefreshConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(var: &str, value: &str) {
        // SAFETY: every test uses its own variable name.
        unsafe { std::env::set_var(var, value) };
    }

    #[test]
    fn defaults_match_dashboard() {
        let config = ClientConfig::new("http://localhost:3000");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.refresh.interval, Some(Duration::from_secs(30)));
        assert_eq!(config.refresh.stale_after, Duration::from_secs(5));
    }

    #[test]
    fn page_size_is_clamped_to_server_limit() {
        set("MAILTRIAGE_PAGE_SIZE", "500");
        assert_eq!(ClientConfig::from_env("http://localhost").page_size, MAX_LIST_LIMIT);
        // SAFETY: variable is private to this test.
        unsafe { std::env::remove_var("MAILTRIAGE_PAGE_SIZE") };
    }
}
