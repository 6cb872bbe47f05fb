//! Resolution orchestrator.
//!
//! Tries, in order: registered providers, the known-provider directory,
//! in-page oEmbed discovery and finally a scraped bookmark card. Internal
//! failures are logged and reported as "unknown provider"; only a page
//! without a title is reported as such.

use std::sync::Arc;
use tracing::{debug, error, info};
use url::Url;

use crate::bookmark::{BookmarkExtractor, ExtractError};
use crate::error::{EmbedError, FetchError, InternalError};
use crate::fetch::PageFetcher;
use crate::oembed::{validate_response, Discovery, OEmbedDiscoverer};
use crate::providers::{KnownMatch, ProviderDirectory, ProviderRegistry};
use crate::security::{HostLookup, UrlGuard};
use crate::traits::provider::Provider;
use crate::types::config::EmbedConfig;
use crate::types::payload::EmbedResult;
use crate::types::request::{CardType, EmbedRequest};

/// Pipeline outcome before normalization.
#[derive(Debug)]
enum ResolveError {
    /// Returned to the caller as-is
    Rejected(EmbedError),

    /// Logged, then reported as unknown provider
    Internal(InternalError),
}

impl From<InternalError> for ResolveError {
    fn from(err: InternalError) -> Self {
        Self::Internal(err)
    }
}

impl From<FetchError> for ResolveError {
    fn from(err: FetchError) -> Self {
        Self::Internal(err.into())
    }
}

/// Resolves URLs into oEmbed payloads or bookmark cards.
///
/// Cheap to share behind an `Arc`; concurrent calls only read the
/// registry, directory and scraping rules.
#[derive(Debug, Clone)]
pub struct EmbedResolver {
    fetcher: PageFetcher,
    registry: ProviderRegistry,
    directory: ProviderDirectory,
    discoverer: OEmbedDiscoverer,
    bookmarks: BookmarkExtractor,
}

impl EmbedResolver {
    /// Resolver with the built-in directory and no custom providers.
    pub fn new(config: EmbedConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: EmbedConfig) -> EmbedResolverBuilder {
        EmbedResolverBuilder::new(config)
    }

    /// The guarded fetcher shared with providers.
    pub fn fetcher(&self) -> &PageFetcher {
        &self.fetcher
    }

    /// Resolve a request.
    pub async fn resolve(&self, request: &EmbedRequest) -> Result<EmbedResult, EmbedError> {
        self.resolve_embed(&request.url, request.card_type).await
    }

    /// Resolve `url` into an embed.
    ///
    /// Errors are always one of the two [`EmbedError`] variants, carrying
    /// `url` as given.
    pub async fn resolve_embed(&self, url: &str, card_type: CardType) -> Result<EmbedResult, EmbedError> {
        info!(url = %url, card_type = %card_type, "Resolving embed");

        match self.run(url, card_type).await {
            Ok(result) => {
                debug!(url = %url, bookmark = result.is_bookmark(), "Embed resolved");
                Ok(result)
            }
            Err(ResolveError::Rejected(err)) => {
                info!(url = %url, error = %err, "Embed rejected");
                Err(err)
            }
            Err(ResolveError::Internal(err)) => {
                error!(url = %url, error = %err, "Encountered error when fetching oembed");
                Err(EmbedError::unknown_provider(url))
            }
        }
    }

    async fn run(&self, raw_url: &str, card_type: CardType) -> Result<EmbedResult, ResolveError> {
        let url = Url::parse(raw_url).map_err(|e| {
            debug!(url = %raw_url, error = %e, "Unparseable URL");
            ResolveError::Rejected(EmbedError::unknown_provider(raw_url))
        })?;

        if let Some(result) = self.registry.resolve(&url, &self.fetcher).await? {
            debug!(url = %url, "Resolved by custom provider");
            return Ok(result);
        }

        if card_type != CardType::Bookmark {
            if let Some(known) = self.directory.find(url.as_str()) {
                return self.fetch_known(raw_url, known).await;
            }
        }

        let page = self.fetcher.fetch_html(url.as_str()).await?;

        if card_type == CardType::Bookmark {
            return self.bookmark(raw_url, &page.html);
        }

        if page.url != url {
            debug!(url = %url, final_url = %page.url, "Followed redirect");
            if let Some(known) = self.directory.find(page.url.as_str()) {
                return self.fetch_known(raw_url, known).await;
            }
        }

        match self
            .discoverer
            .discover(&url, &page.html, card_type, &self.fetcher)
            .await?
        {
            Discovery::Found(payload) => Ok(payload.into()),
            Discovery::NotFound | Discovery::Deferred if card_type == CardType::Unspecified => {
                self.bookmark(raw_url, &page.html)
            }
            Discovery::NotFound | Discovery::Deferred => {
                Err(ResolveError::Rejected(EmbedError::unknown_provider(raw_url)))
            }
        }
    }

    /// Query a known provider's endpoint. Failure does not fall back.
    async fn fetch_known(&self, raw_url: &str, known: KnownMatch<'_>) -> Result<EmbedResult, ResolveError> {
        debug!(
            url = %raw_url,
            provider = %known.provider.name,
            candidate = %known.candidate_url,
            "Matched known provider"
        );

        let endpoint = known
            .provider
            .endpoint_for(&known.candidate_url)
            .map_err(|_| FetchError::InvalidUrl {
                url: known.provider.endpoint.clone(),
            })?;

        let document = self.fetcher.fetch_json(endpoint.as_str()).await?;
        match validate_response(&document.json) {
            Some(payload) => Ok(payload.into()),
            None => {
                debug!(url = %raw_url, provider = %known.provider.name, "Known provider returned invalid oEmbed");
                Err(ResolveError::Rejected(EmbedError::unknown_provider(raw_url)))
            }
        }
    }

    fn bookmark(&self, raw_url: &str, html: &str) -> Result<EmbedResult, ResolveError> {
        match self.bookmarks.extract(raw_url, html) {
            Ok(bookmark) => Ok(bookmark.into()),
            Err(ExtractError::InsufficientMetadata) => Err(ResolveError::Rejected(
                EmbedError::InsufficientMetadata {
                    url: raw_url.to_string(),
                },
            )),
            Err(err) => Err(ResolveError::Internal(err.into())),
        }
    }
}

/// Builder for [`EmbedResolver`].
pub struct EmbedResolverBuilder {
    config: EmbedConfig,
    registry: ProviderRegistry,
    directory: ProviderDirectory,
    guard: Option<UrlGuard>,
    lookup: Option<Arc<dyn HostLookup>>,
}

impl EmbedResolverBuilder {
    fn new(config: EmbedConfig) -> Self {
        Self {
            config,
            registry: ProviderRegistry::new(),
            directory: ProviderDirectory::builtin(),
            guard: None,
            lookup: None,
        }
    }

    /// Register a custom provider. Providers run in registration order.
    pub fn with_provider(mut self, provider: impl Provider + 'static) -> Self {
        self.registry.register(provider);
        self
    }

    /// Register a provider that is also held elsewhere.
    pub fn with_shared_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.registry.register_shared(provider);
        self
    }

    /// Replace the known-provider directory.
    pub fn with_directory(mut self, directory: ProviderDirectory) -> Self {
        self.directory = directory;
        self
    }

    /// Replace the SSRF guard derived from the config.
    pub fn with_guard(mut self, guard: UrlGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Replace the system DNS lookup used when connecting.
    pub fn with_host_lookup(mut self, lookup: Arc<dyn HostLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn build(self) -> EmbedResolver {
        let mut fetcher = PageFetcher::new(&self.config);
        if let Some(guard) = self.guard {
            fetcher = fetcher.with_guard(guard);
        }
        if let Some(lookup) = self.lookup {
            fetcher = fetcher.with_lookup(lookup);
        }

        EmbedResolver {
            fetcher,
            registry: self.registry,
            directory: self.directory,
            discoverer: OEmbedDiscoverer::new(),
            bookmarks: BookmarkExtractor::new(&self.config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_bookmark, MockProvider};

    #[tokio::test]
    async fn test_unparseable_url_is_unknown_provider() {
        let resolver = EmbedResolver::new(EmbedConfig::default());
        let err = resolver
            .resolve_embed("not a url", CardType::Unspecified)
            .await
            .unwrap_err();
        assert_eq!(err, EmbedError::unknown_provider("not a url"));
    }

    #[tokio::test]
    async fn test_private_host_is_unknown_provider() {
        let resolver = EmbedResolver::new(EmbedConfig::default());
        for url in ["http://10.0.0.5/admin", "http://localhost/", "http://[::1]/", "ftp://example.com/"] {
            let err = resolver.resolve_embed(url, CardType::Unspecified).await.unwrap_err();
            assert_eq!(err, EmbedError::unknown_provider(url));
        }
    }

    #[tokio::test]
    async fn test_custom_provider_result_returned_verbatim() {
        let provider = MockProvider::resolving(sample_bookmark("Custom"));
        let resolver = EmbedResolver::builder(EmbedConfig::default())
            .with_provider(provider.clone())
            .build();

        // The host is never fetched; the provider answers first.
        let result = resolver
            .resolve(&EmbedRequest::new("https://unreachable.invalid/item"))
            .await
            .unwrap();
        assert_eq!(result, sample_bookmark("Custom"));
        assert_eq!(provider.fetch_call_count(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_is_unknown_provider() {
        let failing = MockProvider::failing("boom");
        let later = MockProvider::resolving(sample_bookmark("Later"));
        let resolver = EmbedResolver::builder(EmbedConfig::default())
            .with_provider(failing)
            .with_provider(later.clone())
            .build();

        let err = resolver
            .resolve_embed("https://example.com/a", CardType::Unspecified)
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::UnknownProvider { .. }));
        assert_eq!(later.fetch_call_count(), 0);
    }

    #[test]
    fn test_resolver_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EmbedResolver>();
    }
}
