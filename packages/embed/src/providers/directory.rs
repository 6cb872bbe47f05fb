//! Directory of well-known oEmbed providers.
//!
//! Provider directories are often stale about `http` vs `https` and `www`,
//! so [`ProviderDirectory::find`] tries four scheme/host variants of the URL
//! before giving up.

use regex::Regex;
use tracing::warn;
use url::Url;

/// Built-in providers: (name, provider url, endpoint, URL schemes).
const BUILTIN_PROVIDERS: &[(&str, &str, &str, &[&str])] = &[
    (
        "YouTube",
        "https://www.youtube.com/",
        "https://www.youtube.com/oembed",
        &[
            "https://*.youtube.com/watch*",
            "https://*.youtube.com/v/*",
            "https://youtu.be/*",
            "https://*.youtube.com/playlist?list=*",
            "https://youtube.com/playlist?list=*",
            "https://*.youtube.com/shorts*",
            "https://youtube.com/shorts*",
            "https://*.youtube.com/embed/*",
            "https://*.youtube.com/live*",
            "https://youtube.com/live*",
        ],
    ),
    (
        "Vimeo",
        "https://vimeo.com/",
        "https://vimeo.com/api/oembed.{format}",
        &[
            "https://vimeo.com/*",
            "https://vimeo.com/album/*/video/*",
            "https://vimeo.com/channels/*/*",
            "https://vimeo.com/groups/*/videos/*",
            "https://vimeo.com/ondemand/*/*",
            "https://player.vimeo.com/video/*",
        ],
    ),
    (
        "Twitter",
        "https://twitter.com/",
        "https://publish.twitter.com/oembed",
        &[
            "https://twitter.com/*",
            "https://twitter.com/*/status/*",
            "https://*.twitter.com/*/status/*",
            "https://x.com/*/status/*",
        ],
    ),
    (
        "Flickr",
        "https://www.flickr.com/",
        "https://www.flickr.com/services/oembed/",
        &[
            "http://*.flickr.com/photos/*",
            "http://flic.kr/p/*",
            "https://*.flickr.com/photos/*",
            "https://flic.kr/p/*",
        ],
    ),
    (
        "Spotify",
        "https://spotify.com/",
        "https://open.spotify.com/oembed",
        &["https://open.spotify.com/*", "spotify:*"],
    ),
    (
        "SoundCloud",
        "http://soundcloud.com/",
        "https://soundcloud.com/oembed",
        &[
            "http://soundcloud.com/*",
            "https://soundcloud.com/*",
            "https://on.soundcloud.com/*",
        ],
    ),
    (
        "CodePen",
        "https://codepen.io",
        "https://codepen.io/api/oembed",
        &["http://codepen.io/*", "https://codepen.io/*"],
    ),
    (
        "TikTok",
        "http://www.tiktok.com/",
        "https://www.tiktok.com/oembed",
        &["https://www.tiktok.com/*", "https://www.tiktok.com/*/video/*"],
    ),
    (
        "GIPHY",
        "https://giphy.com",
        "https://giphy.com/services/oembed",
        &[
            "https://giphy.com/gifs/*",
            "https://giphy.com/clips/*",
            "http://gph.is/*",
            "https://media.giphy.com/media/*/giphy.gif",
        ],
    ),
    (
        "SlideShare",
        "https://www.slideshare.net/",
        "https://www.slideshare.net/api/oembed/2",
        &[
            "https://www.slideshare.net/*/*",
            "http://www.slideshare.net/*/*",
            "https://fr.slideshare.net/*/*",
            "https://de.slideshare.net/*/*",
            "https://es.slideshare.net/*/*",
            "https://pt.slideshare.net/*/*",
        ],
    ),
];

/// A provider with a published oEmbed endpoint.
#[derive(Debug, Clone)]
pub struct KnownProvider {
    pub name: String,
    pub provider_url: String,
    /// Endpoint URL, optionally containing a `{format}` placeholder
    pub endpoint: String,
    schemes: Vec<Regex>,
}

impl KnownProvider {
    /// Create a provider from glob-style URL schemes (`*` matches anything).
    ///
    /// Schemes that fail to compile are logged and skipped.
    pub fn new(
        name: impl Into<String>,
        provider_url: impl Into<String>,
        endpoint: impl Into<String>,
        schemes: &[&str],
    ) -> Self {
        let name = name.into();
        let schemes = schemes
            .iter()
            .filter_map(|scheme| match glob_to_regex(scheme) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(provider = %name, scheme = %scheme, error = %e, "Skipping bad provider scheme");
                    None
                }
            })
            .collect();

        Self {
            name,
            provider_url: provider_url.into(),
            endpoint: endpoint.into(),
            schemes,
        }
    }

    /// Whether any of the provider's schemes match the URL.
    pub fn matches(&self, url: &str) -> bool {
        self.schemes.iter().any(|re| re.is_match(url))
    }

    /// The endpoint request URL for a matched page URL.
    pub fn endpoint_for(&self, page_url: &str) -> Result<Url, url::ParseError> {
        let mut endpoint = Url::parse(&self.endpoint.replace("{format}", "json"))?;
        endpoint
            .query_pairs_mut()
            .append_pair("url", page_url)
            .append_pair("format", "json");
        Ok(endpoint)
    }
}

/// A successful directory lookup.
#[derive(Debug, Clone)]
pub struct KnownMatch<'a> {
    /// The URL variant that matched
    pub candidate_url: String,
    pub provider: &'a KnownProvider,
}

/// Static, ordered list of known providers.
#[derive(Debug, Clone, Default)]
pub struct ProviderDirectory {
    providers: Vec<KnownProvider>,
}

impl ProviderDirectory {
    /// Create a directory from an explicit provider list.
    pub fn new(providers: Vec<KnownProvider>) -> Self {
        Self { providers }
    }

    /// The built-in directory of well-known providers.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_PROVIDERS
                .iter()
                .map(|(name, provider_url, endpoint, schemes)| {
                    KnownProvider::new(*name, *provider_url, *endpoint, schemes)
                })
                .collect(),
        )
    }

    /// Add a provider after the existing ones.
    pub fn with_provider(mut self, provider: KnownProvider) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Find a provider for the URL, trying scheme and `www` variants.
    ///
    /// Variants are tried in the order `http://x`, `https://x`,
    /// `http://www.x`, `https://www.x`; the first one any provider matches
    /// is returned.
    pub fn find(&self, url: &str) -> Option<KnownMatch<'_>> {
        let base = strip_scheme_and_www(url);
        let candidates = [
            format!("http://{base}"),
            format!("https://{base}"),
            format!("http://www.{base}"),
            format!("https://www.{base}"),
        ];

        candidates.into_iter().find_map(|candidate| {
            self.providers
                .iter()
                .find(|provider| provider.matches(&candidate))
                .map(|provider| KnownMatch {
                    candidate_url: candidate,
                    provider,
                })
        })
    }
}

fn strip_scheme_and_www(url: &str) -> &str {
    let rest = if let Some(rest) = url.strip_prefix("//") {
        rest
    } else if let Some(rest) = url.strip_prefix("http://") {
        rest
    } else if let Some(rest) = url.strip_prefix("https://") {
        rest
    } else {
        return url;
    };
    rest.strip_prefix("www.").unwrap_or(rest)
}

fn glob_to_regex(glob: &str) -> Result<Regex, regex::Error> {
    let pattern = glob
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{pattern}$"))
}
