//! Validation of upstream oEmbed responses.
//!
//! Only whitelisted fields survive, and each type must carry the fields the
//! oEmbed format requires for it. Anything else is rejected rather than
//! passed through.

use serde_json::{Map, Value};
use tracing::debug;

use crate::types::payload::{
    Dimension, FrameEmbed, LinkEmbed, OEmbedCommon, OEmbedPayload, OEmbedType, PhotoEmbed,
};

/// Fields retained from any upstream oEmbed response.
pub const OEMBED_FIELDS: [&str; 14] = [
    "type",
    "version",
    "html",
    "url",
    "title",
    "width",
    "height",
    "author_name",
    "author_url",
    "provider_name",
    "provider_url",
    "thumbnail_url",
    "thumbnail_width",
    "thumbnail_height",
];

impl OEmbedPayload {
    /// Validate a raw response body and keep only whitelisted fields.
    ///
    /// Returns `None` when `type`/`version` are missing, the type is not one
    /// of photo/video/link/rich, or a type-specific required field is
    /// missing.
    pub fn from_response(body: &Value) -> Option<Self> {
        validate_response(body)
    }
}

/// See [`OEmbedPayload::from_response`].
pub fn validate_response(body: &Value) -> Option<OEmbedPayload> {
    let Some(obj) = body.as_object() else {
        debug!("oEmbed response is not an object");
        return None;
    };

    let (Some(type_name), Some(version)) = (text(obj, "type"), version(obj)) else {
        debug!("oEmbed response missing type or version");
        return None;
    };
    let Some(kind) = OEmbedType::parse(&type_name) else {
        debug!(kind = %type_name, "oEmbed response has unsupported type");
        return None;
    };

    let common = OEmbedCommon {
        version,
        title: text(obj, "title"),
        author_name: text(obj, "author_name"),
        author_url: text(obj, "author_url"),
        provider_name: text(obj, "provider_name"),
        provider_url: text(obj, "provider_url"),
        thumbnail_url: text(obj, "thumbnail_url"),
        thumbnail_width: dimension(obj, "thumbnail_width"),
        thumbnail_height: dimension(obj, "thumbnail_height"),
    };
    let html = text(obj, "html");
    let url = text(obj, "url");
    let width = dimension(obj, "width");
    let height = dimension(obj, "height");

    let payload = match kind {
        OEmbedType::Photo => {
            let Some(url) = url else {
                debug!("photo oEmbed without url");
                return None;
            };
            OEmbedPayload::Photo(PhotoEmbed {
                common,
                url,
                html,
                width,
                height,
            })
        }
        OEmbedType::Video | OEmbedType::Rich => {
            let width = width.filter(Dimension::is_present);
            let height = height.filter(Dimension::is_present);
            let (Some(html), Some(width), Some(height)) = (html, width, height) else {
                debug!(kind = %kind, "oEmbed missing html, width or height");
                return None;
            };
            let frame = FrameEmbed {
                common,
                html,
                width,
                height,
                url,
            };
            if kind == OEmbedType::Video {
                OEmbedPayload::Video(frame)
            } else {
                OEmbedPayload::Rich(frame)
            }
        }
        OEmbedType::Link => OEmbedPayload::Link(LinkEmbed {
            common,
            url,
            html,
            width,
            height,
        }),
    };

    Some(payload)
}

/// A non-empty string field.
fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `version` is usually `"1.0"` but some providers send a number.
fn version(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("version")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn dimension(obj: &Map<String, Value>, key: &str) -> Option<Dimension> {
    obj.get(key).and_then(Dimension::from_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_photo_requires_url() {
        assert!(validate_response(&json!({"type": "photo", "version": "1.0"})).is_none());

        let photo = validate_response(&json!({
            "type": "photo",
            "version": "1.0",
            "url": "https://img.example.com/a.jpg",
            "width": 800,
            "height": 600
        }))
        .unwrap();
        assert_eq!(photo.kind(), OEmbedType::Photo);
        assert_eq!(photo.url(), Some("https://img.example.com/a.jpg"));
    }

    #[test]
    fn test_video_and_rich_require_html_and_dimensions() {
        let missing_height = json!({
            "type": "video", "version": "1.0", "html": "<iframe></iframe>", "width": 640
        });
        assert!(validate_response(&missing_height).is_none());

        let zero_width = json!({
            "type": "rich", "version": "1.0", "html": "<div></div>", "width": 0, "height": 300
        });
        assert!(validate_response(&zero_width).is_none());

        let rich = json!({
            "type": "rich", "version": "1.0", "html": "<div></div>", "width": 600, "height": null
        });
        assert!(validate_response(&rich).is_none());

        let video = json!({
            "type": "video", "version": "1.0", "html": "<iframe></iframe>", "width": 640, "height": 360
        });
        assert_eq!(validate_response(&video).unwrap().kind(), OEmbedType::Video);
    }

    #[test]
    fn test_rejects_missing_or_unknown_type() {
        assert!(validate_response(&json!({"version": "1.0"})).is_none());
        assert!(validate_response(&json!({"type": "link"})).is_none());
        assert!(validate_response(&json!({"type": "", "version": "1.0"})).is_none());
        assert!(validate_response(&json!({"type": "bookmark", "version": "1.0"})).is_none());
        assert!(validate_response(&json!(["type", "link"])).is_none());
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let link = validate_response(&json!({
            "type": "link",
            "version": 1.0,
            "title": "Hello",
            "provider_name": "Example",
            "cache_age": 3600,
            "session_token": "secret",
            "html": "<a></a>"
        }))
        .unwrap();

        let value = serde_json::to_value(&link).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        for key in keys {
            assert!(OEMBED_FIELDS.contains(&key.as_str()), "leaked field {key}");
        }
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["title"], "Hello");
    }
}
