//! # Server Configuration
//!
//! Read once at startup from the environment (after `.env` is loaded).
//! The credential never leaves this process.

use std::time::Duration;

pub const DEFAULT_UPSTREAM_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Clone)]
pub struct ServerConfig {
    /// Upstream API credential; `None` puts the gateway in missing-credential mode
    pub api_key: Option<String>,
    pub upstream_url: String,
    /// Limit for single-shot upstream calls
    pub upstream_timeout: Duration,
}

// Hand-written so the key never ends up in logs
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("upstream_url", &self.upstream_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

impl ServerConfig {
    /// `GEMINI_API_KEY` (or `API_KEY`), `WEAVEWIKI_UPSTREAM_URL`,
    /// `WEAVEWIKI_UPSTREAM_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|name| lookup(name))
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty());

        let upstream_url = lookup("WEAVEWIKI_UPSTREAM_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string());

        let upstream_timeout = lookup("WEAVEWIKI_UPSTREAM_TIMEOUT_SECS")
            .and_then(|secs| secs.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        Self {
            api_key,
            upstream_url,
            upstream_timeout,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_without_env() {
        let config = config(&[]);
        assert!(!config.has_credential());
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.upstream_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        assert!(!config(&[("GEMINI_API_KEY", "   ")]).has_credential());
        let fallback = config(&[("GEMINI_API_KEY", ""), ("API_KEY", "k-123")]);
        assert_eq!(fallback.api_key.as_deref(), Some("k-123"));
    }

    #[test]
    fn test_upstream_overrides() {
        let config = config(&[
            ("WEAVEWIKI_UPSTREAM_URL", "http://127.0.0.1:9999/"),
            ("WEAVEWIKI_UPSTREAM_TIMEOUT_SECS", "5"),
        ]);
        assert_eq!(config.upstream_url, "http://127.0.0.1:9999");
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_debug_redacts_key() {
        let shown = format!("{:?}", config(&[("GEMINI_API_KEY", "secret-key")]));
        assert!(!shown.contains("secret-key"));
        assert!(shown.contains("<redacted>"));
    }
}
