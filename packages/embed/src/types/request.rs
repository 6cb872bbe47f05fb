//! Embed request types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The card type a caller asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    /// No preference: oEmbed when available, bookmark otherwise.
    #[default]
    Unspecified,

    /// Skip all oEmbed strategies and scrape a bookmark card.
    Bookmark,

    /// Explicitly want the oEmbed card, even from generic blogging
    /// platforms, and never fall back to a bookmark.
    Embed,
}

impl CardType {
    /// True when the caller expressed any preference.
    pub fn is_explicit(self) -> bool {
        self != CardType::Unspecified
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardType::Unspecified => f.write_str("unspecified"),
            CardType::Bookmark => f.write_str("bookmark"),
            CardType::Embed => f.write_str("embed"),
        }
    }
}

impl FromStr for CardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "unspecified" => Ok(CardType::Unspecified),
            "bookmark" => Ok(CardType::Bookmark),
            "embed" => Ok(CardType::Embed),
            other => Err(format!("unknown card type: {other}")),
        }
    }
}

/// A single, immutable embed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// The URL to resolve, exactly as supplied.
    pub url: String,

    /// Requested card type.
    #[serde(default, rename = "type")]
    pub card_type: CardType,
}

impl EmbedRequest {
    /// Create a request with no card type preference.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            card_type: CardType::Unspecified,
        }
    }

    /// Set the requested card type.
    pub fn with_card_type(mut self, card_type: CardType) -> Self {
        self.card_type = card_type;
        self
    }

    /// Shorthand for a bookmark request.
    pub fn bookmark(url: impl Into<String>) -> Self {
        Self::new(url).with_card_type(CardType::Bookmark)
    }
}
