//! In-page oEmbed discovery.

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::InternalError;
use crate::fetch::PageFetcher;
use crate::oembed::validate::validate_response;
use crate::types::payload::OEmbedPayload;
use crate::types::request::CardType;

/// Path fragment of the generic WordPress oEmbed endpoint.
const GENERIC_BLOG_ENDPOINT: &str = "wp-json/oembed";

/// Outcome of looking for an oEmbed link in a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// A valid oEmbed payload was found and fetched.
    Found(OEmbedPayload),

    /// No link, or the linked response failed validation.
    NotFound,

    /// The link points at a generic blogging-platform endpoint whose embeds
    /// render poorly; a bookmark card should be used instead.
    Deferred,
}

/// Finds `<link type="application/json+oembed">` tags and fetches them.
#[derive(Debug, Clone)]
pub struct OEmbedDiscoverer {
    link_selector: Selector,
}

impl Default for OEmbedDiscoverer {
    fn default() -> Self {
        Self::new()
    }
}

impl OEmbedDiscoverer {
    pub fn new() -> Self {
        Self {
            link_selector: Selector::parse(r#"link[type="application/json+oembed"]"#)
                .expect("oEmbed link selector is valid"),
        }
    }

    /// The `href` of the first oEmbed link in the document.
    pub fn find_link(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.link_selector)
            .find_map(|link| link.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())
    }

    /// Discover, fetch and validate the page's oEmbed payload.
    ///
    /// Fetch failures (including malformed JSON) are errors; a response that
    /// fails validation is `NotFound`.
    pub async fn discover(
        &self,
        requested_url: &Url,
        html: &str,
        card_type: CardType,
        fetcher: &PageFetcher,
    ) -> Result<Discovery, InternalError> {
        let Some(href) = self.find_link(html) else {
            debug!(url = %requested_url, "No oEmbed link in page");
            return Ok(Discovery::NotFound);
        };

        if href.contains(GENERIC_BLOG_ENDPOINT) && !card_type.is_explicit() {
            debug!(url = %requested_url, href = %href, "Deferring generic blog oEmbed to bookmark");
            return Ok(Discovery::Deferred);
        }

        let Ok(endpoint) = requested_url.join(&href) else {
            debug!(url = %requested_url, href = %href, "Unusable oEmbed link");
            return Ok(Discovery::NotFound);
        };

        let document = fetcher.fetch_json(endpoint.as_str()).await?;
        match validate_response(&document.json) {
            Some(payload) => Ok(Discovery::Found(payload)),
            None => {
                debug!(url = %requested_url, endpoint = %endpoint, "oEmbed response failed validation");
                Ok(Discovery::NotFound)
            }
        }
    }
}
