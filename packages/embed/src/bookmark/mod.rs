//! Bookmark card extraction from page metadata.

pub mod rules;

use scraper::Html;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::error::InternalError;
use crate::types::config::EmbedConfig;
use crate::types::payload::{BookmarkMetadata, BookmarkPayload};

pub use rules::{Field, FieldRule};

/// Why a bookmark could not be built.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The page has no usable title.
    #[error("no title found")]
    InsufficientMetadata,

    /// The document could not be processed.
    #[error("{0}")]
    Scrape(String),
}

impl From<ExtractError> for InternalError {
    fn from(err: ExtractError) -> Self {
        InternalError::Scrape(err.to_string())
    }
}

/// Scrapes bookmark metadata using a fixed, pre-compiled rule set.
#[derive(Debug, Clone)]
pub struct BookmarkExtractor {
    rules: Vec<FieldRule>,
    max_document_bytes: usize,
}

impl Default for BookmarkExtractor {
    fn default() -> Self {
        Self::new(&EmbedConfig::default())
    }
}

impl BookmarkExtractor {
    pub fn new(config: &EmbedConfig) -> Self {
        Self {
            rules: rules::default_rules(),
            max_document_bytes: config.max_document_bytes,
        }
    }

    /// Build a bookmark card for `requested_url` from its HTML.
    ///
    /// The payload echoes `requested_url` exactly as given. Its parsed form is
    /// the base for relative links.
    pub fn extract(&self, requested_url: &str, html: &str) -> Result<BookmarkPayload, ExtractError> {
        let url = Url::parse(requested_url)
            .map_err(|e| ExtractError::Scrape(format!("invalid page URL {requested_url}: {e}")))?;

        if html.len() > self.max_document_bytes {
            return Err(ExtractError::Scrape(format!(
                "document of {} bytes exceeds limit of {}",
                html.len(),
                self.max_document_bytes
            )));
        }

        let mut fields = self.scrape(&url, html);

        let Some(title) = fields.remove(&Field::Title) else {
            debug!(url = %url, "Page has no title");
            return Err(ExtractError::InsufficientMetadata);
        };

        let metadata = BookmarkMetadata {
            url: fields
                .remove(&Field::Url)
                .unwrap_or_else(|| requested_url.to_string()),
            title,
            description: fields.remove(&Field::Description),
            author: fields.remove(&Field::Author),
            publisher: fields.remove(&Field::Publisher),
            thumbnail: fields.remove(&Field::Image),
            icon: fields.remove(&Field::Logo),
        };

        debug!(url = %url, title = %metadata.title, "Extracted bookmark metadata");
        Ok(BookmarkPayload::new(requested_url, metadata))
    }

    fn scrape(&self, url: &Url, html: &str) -> HashMap<Field, String> {
        let document = Html::parse_document(html);
        self.rules
            .iter()
            .filter_map(|rule| rule.apply(&document, url).map(|value| (rule.field, value)))
            .collect()
    }
}
