//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that register custom providers
//! without making real network calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

use crate::error::InternalError;
use crate::fetch::PageFetcher;
use crate::security::HostLookup;
use crate::traits::provider::{Provider, ProviderOutcome};
use crate::types::payload::{BookmarkMetadata, BookmarkPayload, EmbedResult};

/// What the mock does when asked to fetch.
#[derive(Debug, Clone)]
enum MockBehavior {
    Resolve(EmbedResult),
    Decline,
    Fail(String),
}

/// A mock provider for testing.
///
/// Clones share call tracking, so a clone can be registered while the
/// original is kept for assertions.
#[derive(Debug, Clone)]
pub struct MockProvider {
    name: String,
    behavior: MockBehavior,

    /// Only URLs whose host contains this string are handled
    host_filter: Option<String>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockProvider {
    fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            name: "mock".to_string(),
            behavior,
            host_filter: None,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// A provider that returns `result` for every URL it handles.
    pub fn resolving(result: EmbedResult) -> Self {
        Self::with_behavior(MockBehavior::Resolve(result))
    }

    /// A provider that claims URLs and then declines them.
    pub fn declining() -> Self {
        Self::with_behavior(MockBehavior::Decline)
    }

    /// A provider that fails hard with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Fail(message.into()))
    }

    /// Set the provider name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Only handle URLs whose host contains `host`.
    pub fn handling(mut self, host: impl Into<String>) -> Self {
        self.host_filter = Some(host.into());
        self
    }

    /// URLs passed to `fetch`, in call order.
    pub fn fetch_calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn fetch_call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn can_handle(&self, url: &Url) -> bool {
        match &self.host_filter {
            Some(filter) => url.host_str().is_some_and(|host| host.contains(filter.as_str())),
            None => true,
        }
    }

    async fn fetch(&self, url: &Url, _fetcher: &PageFetcher) -> Result<ProviderOutcome, InternalError> {
        self.calls.write().unwrap().push(url.to_string());

        match &self.behavior {
            MockBehavior::Resolve(result) => Ok(ProviderOutcome::Resolved(result.clone())),
            MockBehavior::Decline => Ok(ProviderOutcome::Declined),
            MockBehavior::Fail(message) => Err(InternalError::Provider(message.clone().into())),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A host lookup answering from a fixed table.
///
/// Unknown names fail with `NotFound`, so tests never touch real DNS.
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    hosts: HashMap<String, Vec<IpAddr>>,
    delay: Option<Duration>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `host` to `ip` (in addition to any earlier entries).
    pub fn with_host(mut self, host: impl Into<String>, ip: IpAddr) -> Self {
        self.hosts
            .entry(host.into().to_ascii_lowercase())
            .or_default()
            .push(ip);
        self
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl HostLookup for StaticLookup {
    async fn lookup(&self, host: &str) -> std::io::Result<Vec<IpAddr>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.hosts
            .get(&host.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, format!("unknown host {host}")))
    }
}

/// A bookmark result whose contents are derived from `title`.
pub fn sample_bookmark(title: &str) -> EmbedResult {
    let url = format!("https://example.com/{}", title.to_lowercase().replace(' ', "-"));
    EmbedResult::Bookmark(BookmarkPayload::new(
        url.clone(),
        BookmarkMetadata {
            url,
            title: title.to_string(),
            description: None,
            author: None,
            publisher: Some("Example".to_string()),
            thumbnail: None,
            icon: None,
        },
    ))
}
