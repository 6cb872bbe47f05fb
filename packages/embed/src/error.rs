//! Typed errors for the embed resolver.
//!
//! Callers only ever see [`EmbedError`]. Everything below it is the internal
//! failure family that the resolver logs and folds into
//! [`EmbedError::UnknownProvider`].

use thiserror::Error;

/// The two externally visible outcomes of a failed resolution.
///
/// Both belong to the validation family and carry the URL that was
/// originally requested.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmbedError {
    /// No strategy could produce a usable embed.
    ///
    /// Also returned for SSRF rejections and any internal failure, so that
    /// requesters learn nothing about network topology.
    #[error("No provider found for supplied URL.")]
    UnknownProvider { url: String },

    /// Bookmark scraping could not derive a title.
    #[error("URL contains insufficient metadata.")]
    InsufficientMetadata { url: String },
}

impl EmbedError {
    /// Shorthand for the unknown-provider outcome.
    pub fn unknown_provider(url: impl Into<String>) -> Self {
        Self::UnknownProvider { url: url.into() }
    }

    /// The originally requested URL.
    pub fn url(&self) -> &str {
        match self {
            Self::UnknownProvider { url } | Self::InsufficientMetadata { url } => url,
        }
    }
}

/// Internal failures. Logged with full detail, never returned to callers.
#[derive(Debug, Error)]
pub enum InternalError {
    /// A guarded fetch failed.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A registered provider failed hard.
    #[error("provider error: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The metadata-scraping pipeline could not process the document.
    #[error("scrape error: {0}")]
    Scrape(String),
}

/// Errors raised by the page fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The SSRF guard rejected the requested, redirected or final URL
    #[error("security error: {0}")]
    Security(#[from] SecurityError),

    /// Transport-level failure (connect, TLS, redirect policy, body read)
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The bounded fetch timeout elapsed
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// The body exceeded the configured size limit
    #[error("response body too large from {url}: {size} bytes")]
    BodyTooLarge { url: String, size: usize },

    /// The body was not valid JSON
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL could not be built or parsed
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

impl FetchError {
    /// Classify a reqwest error, keeping the URL for timeouts.
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Http(err)
        }
    }
}

/// Security-related errors for SSRF protection.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// URL scheme not allowed (e.g., file://, ftp://)
    #[error("disallowed URL scheme: {0}")]
    DisallowedScheme(String),

    /// Host is blocked (localhost, IP literals)
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// Host resolved into a blocked CIDR range
    #[error("blocked IP range: {0}")]
    BlockedCidr(String),

    /// URL has no host
    #[error("URL has no host")]
    NoHost,

    /// DNS resolution failed
    #[error("DNS resolution failed: {0}")]
    DnsResolution(String),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Errors loading [`crate::EmbedConfig`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SITE_URL is not a valid URL: {0}")]
    SiteUrl(#[source] url::ParseError),

    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Result type alias for security operations.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;
