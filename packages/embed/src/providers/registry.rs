//! Ordered registry of custom providers.

use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::error::InternalError;
use crate::fetch::PageFetcher;
use crate::traits::provider::{Provider, ProviderOutcome};
use crate::types::payload::EmbedResult;

/// Custom providers in priority order. First registered is tried first.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider at the lowest priority.
    pub fn register(&mut self, provider: impl Provider + 'static) {
        self.providers.push(Arc::new(provider));
    }

    /// Append an already shared provider.
    pub fn register_shared(&mut self, provider: Arc<dyn Provider>) {
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Try each provider in order.
    ///
    /// Returns the first resolved embed, `None` when every provider declined
    /// or none could handle the URL. A provider error aborts the chain.
    pub async fn resolve(
        &self,
        url: &Url,
        fetcher: &PageFetcher,
    ) -> Result<Option<EmbedResult>, InternalError> {
        for provider in &self.providers {
            if !provider.can_handle(url) {
                continue;
            }

            debug!(provider = provider.name(), url = %url, "Provider claimed URL");
            match provider.fetch(url, fetcher).await {
                Ok(ProviderOutcome::Resolved(result)) => return Ok(Some(result)),
                Ok(ProviderOutcome::Declined) => {
                    debug!(provider = provider.name(), url = %url, "Provider declined");
                }
                Err(e) => {
                    warn!(provider = provider.name(), url = %url, error = %e, "Provider failed");
                    return Err(e);
                }
            }
        }

        Ok(None)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_bookmark, MockProvider};
    use crate::types::config::EmbedConfig;

    fn url() -> Url {
        Url::parse("https://video.example.com/watch/1").unwrap()
    }

    #[tokio::test]
    async fn test_first_resolved_wins() {
        let fetcher = PageFetcher::new(&EmbedConfig::default());
        let first = MockProvider::resolving(sample_bookmark("first")).named("first");
        let second = MockProvider::resolving(sample_bookmark("second")).named("second");

        let mut registry = ProviderRegistry::new();
        registry.register(first.clone());
        registry.register(second.clone());

        let result = registry.resolve(&url(), &fetcher).await.unwrap().unwrap();
        assert_eq!(result, sample_bookmark("first"));
        assert_eq!(first.fetch_call_count(), 1);
        assert_eq!(second.fetch_call_count(), 0);
    }

    #[tokio::test]
    async fn test_declining_and_unmatched_providers_are_skipped() {
        let fetcher = PageFetcher::new(&EmbedConfig::default());
        let unmatched = MockProvider::resolving(sample_bookmark("nope")).handling("other.com");
        let declining = MockProvider::declining();
        let resolving = MockProvider::resolving(sample_bookmark("yes"));

        let mut registry = ProviderRegistry::new();
        registry.register(unmatched.clone());
        registry.register(declining.clone());
        registry.register(resolving);

        let result = registry.resolve(&url(), &fetcher).await.unwrap();
        assert_eq!(result, Some(sample_bookmark("yes")));
        assert_eq!(unmatched.fetch_call_count(), 0);
        assert_eq!(declining.fetch_call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_stops_the_chain() {
        let fetcher = PageFetcher::new(&EmbedConfig::default());
        let failing = MockProvider::failing("upstream exploded");
        let later = MockProvider::resolving(sample_bookmark("later"));

        let mut registry = ProviderRegistry::new();
        registry.register(failing);
        registry.register(later.clone());

        assert!(registry.resolve(&url(), &fetcher).await.is_err());
        assert_eq!(later.fetch_call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_registry_resolves_nothing() {
        let fetcher = PageFetcher::new(&EmbedConfig::default());
        let registry = ProviderRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.resolve(&url(), &fetcher).await.unwrap(), None);
    }
}
