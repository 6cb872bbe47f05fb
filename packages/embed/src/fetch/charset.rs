//! Character set detection and decoding for fetched HTML.

use encoding_rs::Encoding;
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, warn};

/// How far into the body we look for a `<meta>` charset declaration.
const SNIFF_LIMIT: usize = 1024;

lazy_static! {
    static ref HEADER_CHARSET: Regex =
        Regex::new(r#"(?i)charset\s*=\s*["']?\s*([A-Za-z0-9_.:\-]+)"#).unwrap();
    static ref META_CHARSET: Regex =
        Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([A-Za-z0-9_.:\-]+)"#).unwrap();
}

/// Detect the encoding of an HTML body.
///
/// A byte-order mark wins, then the `Content-Type` header, then a
/// `<meta charset>` or `<meta http-equiv="Content-Type">` declaration near
/// the top of the document. Returns `None` when nothing usable is declared.
pub fn detect(headers: &HashMap<String, String>, body: &[u8]) -> Option<&'static Encoding> {
    if let Some((encoding, _)) = Encoding::for_bom(body) {
        return Some(encoding);
    }

    let from_header = headers
        .get("content-type")
        .and_then(|value| HEADER_CHARSET.captures(value))
        .and_then(|caps| Encoding::for_label(caps[1].as_bytes()));
    if from_header.is_some() {
        return from_header;
    }

    let head = String::from_utf8_lossy(&body[..body.len().min(SNIFF_LIMIT)]);
    META_CHARSET
        .captures(&head)
        .and_then(|caps| Encoding::for_label(caps[1].as_bytes()))
}

/// Decode an HTML body to text.
///
/// Undetectable charsets and decoding errors both degrade to decoding the
/// raw bytes as UTF-8 with replacement characters.
pub fn decode(headers: &HashMap<String, String>, body: &[u8]) -> String {
    let Some(encoding) = detect(headers, body) else {
        return raw(body);
    };

    let (text, actual, had_errors) = encoding.decode(body);
    if had_errors {
        warn!(
            charset = actual.name(),
            "Malformed bytes while decoding page, returning raw body"
        );
        return raw(body);
    }

    debug!(charset = actual.name(), "Decoded page body");
    match text {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}

fn raw(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(content_type: &str) -> HashMap<String, String> {
        HashMap::from([("content-type".to_string(), content_type.to_string())])
    }

    #[test]
    fn test_header_charset_wins_over_meta() {
        let body = br#"<meta charset="utf-8"><title>x</title>"#;
        let encoding = detect(&headers("text/html; charset=ISO-8859-1"), body);
        assert_eq!(encoding, Some(encoding_rs::WINDOWS_1252));
    }

    #[test]
    fn test_meta_charset_sniffed() {
        let body = br#"<html><head><meta charset="shift_jis"></head></html>"#;
        assert_eq!(detect(&HashMap::new(), body), Some(encoding_rs::SHIFT_JIS));

        let http_equiv = br#"<meta http-equiv="Content-Type" content="text/html; charset=windows-1251">"#;
        assert_eq!(
            detect(&headers("text/html"), http_equiv),
            Some(encoding_rs::WINDOWS_1251)
        );
    }

    #[test]
    fn test_no_charset_decodes_raw() {
        let body = "<title>Caf\u{e9}</title>".as_bytes();
        assert_eq!(detect(&headers("text/html"), body), None);
        assert_eq!(decode(&headers("text/html"), body), "<title>Café</title>");
    }

    #[test]
    fn test_decodes_latin1_body() {
        // "Café" in windows-1252
        let body = b"<title>Caf\xe9</title>";
        let text = decode(&headers("text/html; charset=windows-1252"), body);
        assert_eq!(text, "<title>Café</title>");
    }

    #[test]
    fn test_malformed_bytes_fall_back_to_raw() {
        let body = b"<title>ok\xff\xfe\xfd</title>";
        let text = decode(&headers("text/html; charset=utf-8"), body);
        assert!(text.starts_with("<title>ok"));
        assert!(text.contains('\u{fffd}'));
    }

    #[test]
    fn test_unknown_label_ignored() {
        let body = br#"<meta charset="not-a-charset">"#;
        assert_eq!(detect(&HashMap::new(), body), None);
    }
}
