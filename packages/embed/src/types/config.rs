//! Resolver configuration.

use std::env;
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Configuration for the embed resolver.
#[derive(Debug, Clone)]
pub struct EmbedConfig {
    /// The operator's own site URL.
    ///
    /// Requests to this exact host bypass the SSRF guard so the site can
    /// embed its own content.
    pub site_url: Option<Url>,

    /// Upper bound for each network call. Default: 2 seconds.
    pub fetch_timeout: Duration,

    /// User agent sent with every fetch.
    pub user_agent: String,

    /// Maximum redirects followed per fetch. Default: 10.
    pub max_redirects: usize,

    /// Largest response body accepted, in bytes. Default: 5 MiB.
    pub max_body_bytes: usize,

    /// Largest HTML document handed to the scraping pipeline. Default: 2 MiB.
    pub max_document_bytes: usize,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            site_url: None,
            fetch_timeout: Duration::from_secs(2),
            user_agent: format!("embed/{} (+link preview)", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
            max_body_bytes: 5 * 1024 * 1024,
            max_document_bytes: 2 * 1024 * 1024,
        }
    }
}

impl EmbedConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `SITE_URL`, `EMBED_FETCH_TIMEOUT_MS` and `EMBED_USER_AGENT`,
    /// loading a `.env` file first if one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Some(site_url) = env::var("SITE_URL").ok().filter(|v| !v.trim().is_empty()) {
            config.site_url = Some(Url::parse(site_url.trim()).map_err(ConfigError::SiteUrl)?);
        }

        if let Ok(value) = env::var("EMBED_FETCH_TIMEOUT_MS") {
            let ms: u64 = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    name: "EMBED_FETCH_TIMEOUT_MS",
                    value: value.clone(),
                })?;
            config.fetch_timeout = Duration::from_millis(ms);
        }

        if let Ok(user_agent) = env::var("EMBED_USER_AGENT") {
            if !user_agent.trim().is_empty() {
                config.user_agent = user_agent;
            }
        }

        Ok(config)
    }

    /// The operator's own site URL, if configured.
    pub fn site_url(&self) -> Option<&Url> {
        self.site_url.as_ref()
    }

    /// Set the operator's site URL.
    pub fn with_site_url(mut self, url: Url) -> Self {
        self.site_url = Some(url);
        self
    }

    /// Set the per-fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the redirect limit.
    pub fn with_max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Set the response body limit.
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Set the scraping document limit.
    pub fn with_max_document_bytes(mut self, max: usize) -> Self {
        self.max_document_bytes = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EmbedConfig::new();
        assert_eq!(config.fetch_timeout, Duration::from_secs(2));
        assert_eq!(config.max_redirects, 10);
        assert!(config.site_url().is_none());
    }

    #[test]
    fn test_builder() {
        let config = EmbedConfig::new()
            .with_site_url(Url::parse("https://blog.example.com").unwrap())
            .with_fetch_timeout(Duration::from_millis(500))
            .with_user_agent("TestAgent/1.0")
            .with_max_redirects(3);

        assert_eq!(
            config.site_url().map(Url::as_str),
            Some("https://blog.example.com/")
        );
        assert_eq!(config.fetch_timeout, Duration::from_millis(500));
        assert_eq!(config.user_agent, "TestAgent/1.0");
        assert_eq!(config.max_redirects, 3);
    }
}
