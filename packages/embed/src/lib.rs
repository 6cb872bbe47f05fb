//! SSRF-Guarded Embed Resolver
//!
//! Turns an arbitrary user-supplied URL into either an oEmbed payload
//! (photo, video, link, rich) or a bookmark card scraped from the page's
//! metadata, without ever letting the request reach the operator's private
//! network.
//!
//! # Resolution Order
//!
//! 1. Registered custom providers
//! 2. The known-provider directory (YouTube, Vimeo, ...)
//! 3. oEmbed discovery in the fetched page
//! 4. A bookmark card built from `og:*`/`twitter:*`/`<title>` metadata
//!
//! # Usage
//!
//! ```rust,ignore
//! use embed::{CardType, EmbedConfig, EmbedResolver};
//!
//! let resolver = EmbedResolver::new(EmbedConfig::from_env()?);
//!
//! match resolver.resolve_embed("https://vimeo.com/123456", CardType::Unspecified).await {
//!     Ok(embed) => println!("{}", serde_json::to_string_pretty(&embed)?),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - The custom provider plugin trait
//! - [`types`] - Requests, payloads and configuration
//! - [`security`] - SSRF protection
//! - [`fetch`] - Guarded HTTP fetching and charset decoding
//! - [`providers`] - Provider registry and known-provider directory
//! - [`oembed`] - oEmbed discovery and response validation
//! - [`bookmark`] - Metadata scraping for bookmark cards
//! - [`testing`] - Mock implementations for testing

pub mod bookmark;
pub mod error;
pub mod fetch;
pub mod oembed;
pub mod providers;
pub mod resolver;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ConfigError, EmbedError, FetchError, InternalError, SecurityError};
pub use traits::provider::{Provider, ProviderOutcome};
pub use types::{
    config::EmbedConfig,
    payload::{
        BookmarkMetadata, BookmarkPayload, Dimension, EmbedResult, FrameEmbed, LinkEmbed,
        OEmbedCommon, OEmbedPayload, OEmbedType, PhotoEmbed,
    },
    request::{CardType, EmbedRequest},
};

pub use bookmark::BookmarkExtractor;
pub use fetch::PageFetcher;
pub use oembed::{Discovery, OEmbedDiscoverer};
pub use providers::{KnownProvider, ProviderDirectory, ProviderRegistry};
pub use resolver::{EmbedResolver, EmbedResolverBuilder};
pub use security::{GuardedResolver, HostLookup, SystemLookup, UrlGuard};

// Re-export testing utilities
pub use testing::{MockProvider, StaticLookup};
