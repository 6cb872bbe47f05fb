//! Embed payloads - the only shapes that leave the resolver.
//!
//! oEmbed payloads are a tagged union on `type`. Each variant carries the
//! fields the oEmbed format makes mandatory for it as plain (non-optional)
//! fields, so an incomplete payload cannot be constructed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The oEmbed `type` values accepted from upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OEmbedType {
    Photo,
    Video,
    Link,
    Rich,
}

impl OEmbedType {
    /// Parse an upstream `type` value. Unknown types yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "photo" => Some(Self::Photo),
            "video" => Some(Self::Video),
            "link" => Some(Self::Link),
            "rich" => Some(Self::Rich),
            _ => None,
        }
    }
}

impl fmt::Display for OEmbedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Link => "link",
            Self::Rich => "rich",
        };
        f.write_str(name)
    }
}

/// A width or height as sent by the provider.
///
/// Most providers send integers; some send strings such as `"100%"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Pixels(serde_json::Number),
    Text(String),
}

impl Dimension {
    /// Read a dimension from a JSON value. Anything other than a number or a
    /// string is dropped.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => Some(Self::Pixels(n.clone())),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// False for `0` and the empty string.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Pixels(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
            Self::Text(s) => !s.is_empty(),
        }
    }
}

/// Fields every oEmbed type may carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OEmbedCommon {
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_width: Option<Dimension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_height: Option<Dimension>,
}

/// `photo`: `url` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoEmbed {
    #[serde(flatten)]
    pub common: OEmbedCommon,

    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Dimension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Dimension>,
}

/// `video` and `rich`: `html`, `width` and `height` are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameEmbed {
    #[serde(flatten)]
    pub common: OEmbedCommon,

    pub html: String,
    pub width: Dimension,
    pub height: Dimension,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// `link`: nothing beyond the common fields is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEmbed {
    #[serde(flatten)]
    pub common: OEmbedCommon,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Dimension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Dimension>,
}

/// A validated, whitelisted oEmbed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OEmbedPayload {
    Photo(PhotoEmbed),
    Video(FrameEmbed),
    Link(LinkEmbed),
    Rich(FrameEmbed),
}

impl OEmbedPayload {
    /// The oEmbed type of this payload.
    pub fn kind(&self) -> OEmbedType {
        match self {
            Self::Photo(_) => OEmbedType::Photo,
            Self::Video(_) => OEmbedType::Video,
            Self::Link(_) => OEmbedType::Link,
            Self::Rich(_) => OEmbedType::Rich,
        }
    }

    /// Fields shared by all types.
    pub fn common(&self) -> &OEmbedCommon {
        match self {
            Self::Photo(p) => &p.common,
            Self::Video(f) | Self::Rich(f) => &f.common,
            Self::Link(l) => &l.common,
        }
    }

    pub fn html(&self) -> Option<&str> {
        match self {
            Self::Photo(p) => p.html.as_deref(),
            Self::Video(f) | Self::Rich(f) => Some(&f.html),
            Self::Link(l) => l.html.as_deref(),
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Photo(p) => Some(&p.url),
            Self::Video(f) | Self::Rich(f) => f.url.as_deref(),
            Self::Link(l) => l.url.as_deref(),
        }
    }
}

/// Scraped page metadata, already renamed to the card vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkMetadata {
    /// Canonical page URL (falls back to the requested URL).
    pub url: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    /// Lead image of the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// Favicon or site logo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A bookmark card. Serializes with `"type": "bookmark"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "bookmark")]
pub struct BookmarkPayload {
    pub version: String,

    /// The URL that was requested.
    pub url: String,

    pub metadata: BookmarkMetadata,
}

impl BookmarkPayload {
    pub const VERSION: &'static str = "1.0";

    pub fn new(url: impl Into<String>, metadata: BookmarkMetadata) -> Self {
        Self {
            version: Self::VERSION.to_string(),
            url: url.into(),
            metadata,
        }
    }
}

/// The single success shape of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbedResult {
    OEmbed(OEmbedPayload),
    Bookmark(BookmarkPayload),
}

impl EmbedResult {
    pub fn as_oembed(&self) -> Option<&OEmbedPayload> {
        match self {
            Self::OEmbed(payload) => Some(payload),
            Self::Bookmark(_) => None,
        }
    }

    pub fn as_bookmark(&self) -> Option<&BookmarkPayload> {
        match self {
            Self::Bookmark(payload) => Some(payload),
            Self::OEmbed(_) => None,
        }
    }

    pub fn is_bookmark(&self) -> bool {
        matches!(self, Self::Bookmark(_))
    }
}

impl From<OEmbedPayload> for EmbedResult {
    fn from(payload: OEmbedPayload) -> Self {
        Self::OEmbed(payload)
    }
}

impl From<BookmarkPayload> for EmbedResult {
    fn from(payload: BookmarkPayload) -> Self {
        Self::Bookmark(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn video() -> OEmbedPayload {
        OEmbedPayload::Video(FrameEmbed {
            common: OEmbedCommon {
                version: "1.0".into(),
                title: Some("Clip".into()),
                ..Default::default()
            },
            html: "<iframe></iframe>".into(),
            width: Dimension::Pixels(640.into()),
            height: Dimension::Text("360".into()),
            url: None,
        })
    }

    #[test]
    fn test_oembed_serializes_flat_with_type_tag() {
        let value = serde_json::to_value(EmbedResult::from(video())).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "video",
                "version": "1.0",
                "title": "Clip",
                "html": "<iframe></iframe>",
                "width": 640,
                "height": "360"
            })
        );
    }

    #[test]
    fn test_bookmark_serializes_with_bookmark_type() {
        let payload = BookmarkPayload::new(
            "https://example.com",
            BookmarkMetadata {
                url: "https://example.com/".into(),
                title: "Example".into(),
                description: None,
                author: None,
                publisher: Some("Example Co".into()),
                thumbnail: Some("https://example.com/a.png".into()),
                icon: None,
            },
        );
        let value = serde_json::to_value(EmbedResult::from(payload)).unwrap();
        assert_eq!(value["type"], "bookmark");
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["metadata"]["thumbnail"], "https://example.com/a.png");
        assert!(value["metadata"].get("image").is_none());
        assert!(value["metadata"].get("icon").is_none());
    }

    #[test]
    fn test_dimension_presence() {
        assert!(Dimension::Pixels(480.into()).is_present());
        assert!(!Dimension::Pixels(0.into()).is_present());
        assert!(Dimension::Text("100%".into()).is_present());
        assert!(!Dimension::Text(String::new()).is_present());
        assert_eq!(Dimension::from_json(&json!(null)), None);
    }

    #[test]
    fn test_payload_accessors() {
        let payload = video();
        assert_eq!(payload.kind(), OEmbedType::Video);
        assert_eq!(payload.html(), Some("<iframe></iframe>"));
        assert_eq!(payload.common().title.as_deref(), Some("Clip"));
        assert_eq!(OEmbedType::parse("rich"), Some(OEmbedType::Rich));
        assert_eq!(OEmbedType::parse("bookmark"), None);
    }
}
