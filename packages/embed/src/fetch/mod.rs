//! Guarded page fetching.
//!
//! Every fetch is checked by the [`UrlGuard`] before dispatch, on each
//! redirect hop and against the final URL before the body is read. Host
//! names are resolved through [`GuardedResolver`] when each connection is
//! made, so DNS time counts against the fetch timeout. Each call gets its own
//! client and cookie store, so nothing leaks between embed requests.

pub mod charset;

use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::FetchError;
use crate::security::{GuardedResolver, HostLookup, SystemLookup, UrlGuard};
use crate::types::config::EmbedConfig;

/// Raw result of a single guarded fetch.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// URL after redirects
    pub final_url: Url,

    /// Untouched response body
    pub raw_body: Bytes,

    /// Response headers, names lower-cased
    pub headers: HashMap<String, String>,
}

impl FetchResult {
    /// True when the fetch landed somewhere other than `requested`.
    pub fn was_redirected(&self, requested: &Url) -> bool {
        &self.final_url != requested
    }
}

/// Decoded HTML page.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    pub url: Url,
    pub html: String,
}

/// Parsed JSON document.
#[derive(Debug, Clone)]
pub struct JsonDocument {
    pub url: Url,
    pub json: serde_json::Value,
}

/// Per-call fetch options.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Value for the `Accept` header
    pub accept: Option<&'static str>,
}

impl FetchOptions {
    pub fn html() -> Self {
        Self {
            accept: Some("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        }
    }

    pub fn json() -> Self {
        Self {
            accept: Some("application/json"),
        }
    }
}

/// HTTP fetcher with SSRF protection, bounded timeout and isolated cookies.
///
/// Passed to [`crate::Provider`] implementations so custom providers fetch
/// through the same guard.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    guard: UrlGuard,
    lookup: Arc<dyn HostLookup>,
    timeout: Duration,
    user_agent: String,
    max_redirects: usize,
    max_body_bytes: usize,
}

impl PageFetcher {
    /// Create a fetcher from resolver configuration.
    pub fn new(config: &EmbedConfig) -> Self {
        let guard = match config.site_url() {
            Some(site) => UrlGuard::new().with_site_url(site),
            None => UrlGuard::new(),
        };

        Self {
            guard,
            lookup: Arc::new(SystemLookup),
            timeout: config.fetch_timeout,
            user_agent: config.user_agent.clone(),
            max_redirects: config.max_redirects,
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Replace the guard.
    pub fn with_guard(mut self, guard: UrlGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Replace the host name lookup used at connect time.
    pub fn with_lookup(mut self, lookup: Arc<dyn HostLookup>) -> Self {
        self.lookup = lookup;
        self
    }

    /// The guard used for every hop.
    pub fn guard(&self) -> &UrlGuard {
        &self.guard
    }

    /// Build a fresh client: own cookie store, guarded redirects and DNS.
    fn client(&self) -> Result<reqwest::Client, FetchError> {
        let guard = self.guard.clone();
        let max_redirects = self.max_redirects;

        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= max_redirects {
                return attempt.error(format!("too many redirects (max {max_redirects})"));
            }
            match guard.check_url(attempt.url()) {
                Ok(()) => attempt.follow(),
                Err(e) => {
                    warn!(url = %attempt.url(), error = %e, "Blocked redirect");
                    attempt.error(e)
                }
            }
        });

        reqwest::Client::builder()
            .timeout(self.timeout)
            .redirect(policy)
            .dns_resolver(Arc::new(GuardedResolver::new(
                self.guard.clone(),
                self.lookup.clone(),
            )))
            .cookie_store(true)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(FetchError::Http)
    }

    /// Fetch a URL and return the raw body.
    pub async fn fetch_raw(&self, url: &str, options: FetchOptions) -> Result<FetchResult, FetchError> {
        debug!(url = %url, "Guarded fetch starting");
        self.guard.check(url)?;

        let client = self.client()?;
        let mut request = client.get(url);
        if let Some(accept) = options.accept {
            request = request.header(reqwest::header::ACCEPT, accept);
        }

        let mut response = request.send().await.map_err(|e| {
            warn!(url = %url, error = %e, "HTTP request failed");
            FetchError::from_reqwest(url, e)
        })?;

        // Capture final URL after redirects and vet it before reading the body
        let final_url = response.url().clone();
        self.guard.check_url(&final_url)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: final_url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(length) = response.content_length() {
            if length as usize > self.max_body_bytes {
                return Err(FetchError::BodyTooLarge {
                    url: final_url.to_string(),
                    size: length as usize,
                });
            }
        }

        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?
        {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(FetchError::BodyTooLarge {
                    url: final_url.to_string(),
                    size: body.len() + chunk.len(),
                });
            }
            body.extend_from_slice(&chunk);
        }

        debug!(
            url = %url,
            final_url = %final_url,
            status = status.as_u16(),
            bytes = body.len(),
            "Guarded fetch completed"
        );

        Ok(FetchResult {
            final_url,
            raw_body: body.freeze(),
            headers,
        })
    }

    /// Fetch a page and decode it using its declared charset.
    pub async fn fetch_html(&self, url: &str) -> Result<HtmlPage, FetchError> {
        let result = self.fetch_raw(url, FetchOptions::html()).await?;
        let html = charset::decode(&result.headers, &result.raw_body);
        Ok(HtmlPage {
            url: result.final_url,
            html,
        })
    }

    /// Fetch a URL with JSON negotiation and parse the body.
    pub async fn fetch_json(&self, url: &str) -> Result<JsonDocument, FetchError> {
        let result = self.fetch_raw(url, FetchOptions::json()).await?;
        let json = serde_json::from_slice(&result.raw_body)?;
        Ok(JsonDocument {
            url: result.final_url,
            json,
        })
    }
}
