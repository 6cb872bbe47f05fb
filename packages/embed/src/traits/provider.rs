//! Provider trait for pluggable embed sources.
//!
//! Providers are trusted integrations registered once at startup. Each one
//! decides whether it handles a URL and, if so, produces an embed through
//! the shared guarded fetcher.
//!
//! # Usage
//!
//! ```rust,ignore
//! use embed::{EmbedResolver, EmbedConfig};
//!
//! let resolver = EmbedResolver::builder(EmbedConfig::from_env()?)
//!     .with_provider(MyVideoProvider::new())
//!     .build();
//! ```

use async_trait::async_trait;
use url::Url;

use crate::error::InternalError;
use crate::fetch::PageFetcher;
use crate::types::payload::EmbedResult;

/// What a provider did with a URL it claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// The provider produced the embed. Resolution stops here.
    Resolved(EmbedResult),

    /// The provider passed. The next stage is tried.
    Declined,
}

impl From<EmbedResult> for ProviderOutcome {
    fn from(result: EmbedResult) -> Self {
        Self::Resolved(result)
    }
}

/// A custom embed provider.
///
/// Returning `Err` is a hard failure: resolution stops without trying any
/// later stage and the caller sees "unknown provider".
#[async_trait]
pub trait Provider: Send + Sync {
    /// Whether this provider wants to handle the URL.
    fn can_handle(&self, url: &Url) -> bool;

    /// Produce an embed for the URL.
    ///
    /// All network access must go through `fetcher` so the SSRF guard
    /// applies.
    async fn fetch(&self, url: &Url, fetcher: &PageFetcher) -> Result<ProviderOutcome, InternalError>;

    /// Get the provider name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}
