// ⚙️ Configuration - environment first, CLI flags override
//
// Every setting has a CHURCH_* environment variable and a default, so the CLI,
// TUI and view server can all start with zero flags against a local backend.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

pub const ENV_BASE_URL: &str = "CHURCH_API_BASE_URL";
pub const ENV_TOKEN: &str = "CHURCH_API_TOKEN";
pub const ENV_PUBLISHABLE_KEY: &str = "CHURCH_PAYMENT_PUBLISHABLE_KEY";
pub const ENV_TIMEOUT: &str = "CHURCH_HTTP_TIMEOUT_SECS";
pub const ENV_DEBOUNCE: &str = "CHURCH_SEARCH_DEBOUNCE_MS";
pub const ENV_PAGE_SIZE: &str = "CHURCH_PAGE_SIZE";
pub const ENV_LOG_JSON: &str = "CHURCH_LOG_JSON";
pub const ENV_SERVER_ADDR: &str = "CHURCH_SERVER_ADDR";

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend base URL, without trailing slash
    pub base_url: String,

    /// Bearer ID token for CLI/TUI sessions
    pub api_token: Option<String>,

    /// Payment gateway publishable key handed to browser clients
    pub publishable_key: Option<String>,

    pub http_timeout: Duration,
    pub search_debounce: Duration,
    pub page_size: usize,
    pub log_json: bool,
    pub server_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            publishable_key: None,
            http_timeout: Duration::from_secs(15),
            search_debounce: Duration::from_millis(300),
            page_size: crate::listing::DEFAULT_PAGE_SIZE,
            log_json: false,
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup` (the environment, or a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let http_timeout = match get(ENV_TIMEOUT) {
            Some(raw) => Duration::from_secs(
                raw.parse()
                    .with_context(|| format!("{ENV_TIMEOUT} must be whole seconds, got {raw:?}"))?,
            ),
            None => defaults.http_timeout,
        };

        let search_debounce = match get(ENV_DEBOUNCE) {
            Some(raw) => Duration::from_millis(
                raw.parse()
                    .with_context(|| format!("{ENV_DEBOUNCE} must be milliseconds, got {raw:?}"))?,
            ),
            None => defaults.search_debounce,
        };

        let page_size = match get(ENV_PAGE_SIZE) {
            Some(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("{ENV_PAGE_SIZE} must be a number, got {raw:?}"))?
                .max(1),
            None => defaults.page_size,
        };

        let log_json = get(ENV_LOG_JSON)
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(defaults.log_json);

        Ok(AppConfig {
            base_url: get(ENV_BASE_URL)
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            api_token: get(ENV_TOKEN),
            publishable_key: get(ENV_PUBLISHABLE_KEY),
            http_timeout,
            search_debounce,
            page_size,
            log_json,
            server_addr: get(ENV_SERVER_ADDR).unwrap_or(defaults.server_addr),
        })
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        if token.is_some() {
            self.api_token = token;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert!(config.api_token.is_none());
        assert!(!config.log_json);
    }

    #[test]
    fn test_env_values() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "https://church.example.org/"),
            (ENV_TOKEN, "tok"),
            (ENV_PAGE_SIZE, "0"),
            (ENV_LOG_JSON, "true"),
            (ENV_DEBOUNCE, "150"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://church.example.org");
        assert_eq!(config.api_token.as_deref(), Some("tok"));
        assert_eq!(config.page_size, 1);
        assert!(config.log_json);
        assert_eq!(config.search_debounce, Duration::from_millis(150));
    }

    #[test]
    fn test_bad_number_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[(ENV_TIMEOUT, "soon")])).unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT));
    }

    #[test]
    fn test_flag_overrides() {
        let config = AppConfig::default()
            .with_base_url(Some("http://api.local/".to_string()))
            .with_token(None);
        assert_eq!(config.base_url, "http://api.local");
        assert!(config.api_token.is_none());
    }
}
