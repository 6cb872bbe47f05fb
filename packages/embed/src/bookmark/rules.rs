//! Field rules for bookmark scraping.
//!
//! Each [`FieldRule`] is an ordered list of selector sources; the first
//! source yielding a usable value wins.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("Invalid regex");
}

/// A metadata field the extractor knows how to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Url,
    Title,
    Description,
    Author,
    Publisher,
    Image,
    Logo,
}

impl Field {
    /// URL-valued fields are resolved against the page and must be http(s).
    pub fn is_url(self) -> bool {
        matches!(self, Field::Url | Field::Image | Field::Logo)
    }
}

/// Where a value is read from on a matched element.
#[derive(Debug, Clone, Copy)]
enum Read {
    Attr(&'static str),
    Text,
}

#[derive(Debug, Clone)]
struct Source {
    selector: Selector,
    read: Read,
}

/// Ordered sources for one field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: Field,
    sources: Vec<Source>,
}

impl FieldRule {
    fn new(field: Field, sources: &[(&str, Read)]) -> Self {
        let sources = sources
            .iter()
            .map(|(css, read)| Source {
                selector: Selector::parse(css).expect("Invalid selector"),
                read: *read,
            })
            .collect();
        Self { field, sources }
    }

    /// First usable value for this field, or `None`.
    pub fn apply(&self, document: &Html, page_url: &Url) -> Option<String> {
        self.sources.iter().find_map(|source| {
            document
                .select(&source.selector)
                .filter_map(|element| read_value(element, source.read))
                .find_map(|raw| self.normalize(&raw, page_url))
        })
    }

    fn normalize(&self, raw: &str, page_url: &Url) -> Option<String> {
        let value = collapse_whitespace(raw);
        if value.is_empty() {
            return None;
        }

        if self.field.is_url() {
            let resolved = page_url.join(&value).ok()?;
            return matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string());
        }

        if self.field == Field::Author && looks_like_url(&value) {
            return None;
        }

        Some(value)
    }
}

fn read_value(element: ElementRef<'_>, read: Read) -> Option<String> {
    match read {
        Read::Attr(name) => element.value().attr(name).map(str::to_string),
        Read::Text => Some(element.text().collect::<String>()),
    }
}

/// Trim and collapse runs of whitespace to a single space.
pub fn collapse_whitespace(value: &str) -> String {
    WHITESPACE.replace_all(value.trim(), " ").into_owned()
}

fn looks_like_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("//")
        || lower.starts_with("www.")
}

/// The built-in rule set, one rule per [`Field`].
pub fn default_rules() -> Vec<FieldRule> {
    use Read::{Attr, Text};
    const CONTENT: Read = Attr("content");
    const HREF: Read = Attr("href");

    vec![
        FieldRule::new(
            Field::Url,
            &[
                (r#"meta[property="og:url"]"#, CONTENT),
                (r#"meta[name="twitter:url"]"#, CONTENT),
                (r#"meta[property="twitter:url"]"#, CONTENT),
                (r#"link[rel="canonical"]"#, HREF),
            ],
        ),
        FieldRule::new(
            Field::Title,
            &[
                (r#"meta[property="og:title"]"#, CONTENT),
                (r#"meta[name="twitter:title"]"#, CONTENT),
                (r#"meta[property="twitter:title"]"#, CONTENT),
                (r#"meta[name="title"]"#, CONTENT),
                ("title", Text),
                ("h1", Text),
            ],
        ),
        FieldRule::new(
            Field::Description,
            &[
                (r#"meta[property="og:description"]"#, CONTENT),
                (r#"meta[name="twitter:description"]"#, CONTENT),
                (r#"meta[property="twitter:description"]"#, CONTENT),
                (r#"meta[name="description"]"#, CONTENT),
                (r#"meta[itemprop="description"]"#, CONTENT),
            ],
        ),
        FieldRule::new(
            Field::Author,
            &[
                (r#"meta[name="author"]"#, CONTENT),
                (r#"meta[property="article:author"]"#, CONTENT),
                (r#"meta[property="author"]"#, CONTENT),
                (r#"[itemprop="author"] [itemprop="name"]"#, Text),
                (r#"[rel="author"]"#, Text),
            ],
        ),
        FieldRule::new(
            Field::Publisher,
            &[
                (r#"meta[property="og:site_name"]"#, CONTENT),
                (r#"meta[name="application-name"]"#, CONTENT),
                (r#"meta[name="apple-mobile-web-app-title"]"#, CONTENT),
                (r#"meta[name="publisher"]"#, CONTENT),
            ],
        ),
        FieldRule::new(
            Field::Image,
            &[
                (r#"meta[property="og:image:secure_url"]"#, CONTENT),
                (r#"meta[property="og:image:url"]"#, CONTENT),
                (r#"meta[property="og:image"]"#, CONTENT),
                (r#"meta[name="twitter:image:src"]"#, CONTENT),
                (r#"meta[name="twitter:image"]"#, CONTENT),
                (r#"meta[property="twitter:image"]"#, CONTENT),
                (r#"meta[itemprop="image"]"#, CONTENT),
                (r#"link[rel="image_src"]"#, HREF),
            ],
        ),
        FieldRule::new(
            Field::Logo,
            &[
                (r#"link[rel="apple-touch-icon"]"#, HREF),
                (r#"link[rel="apple-touch-icon-precomposed"]"#, HREF),
                (r#"link[rel~="icon"]"#, HREF),
                (r#"meta[property="og:logo"]"#, CONTENT),
                (r#"meta[itemprop="logo"]"#, CONTENT),
                (r#"img[itemprop="logo"]"#, Attr("src")),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(field: Field) -> FieldRule {
        default_rules()
            .into_iter()
            .find(|r| r.field == field)
            .unwrap()
    }

    fn page() -> Url {
        Url::parse("https://example.com/blog/post").unwrap()
    }

    #[test]
    fn test_title_prefers_open_graph() {
        let html = Html::parse_document(
            r#"<html><head>
                <title>Fallback</title>
                <meta property="og:title" content="  Open   Graph
                    Title ">
            </head></html>"#,
        );
        assert_eq!(
            rule(Field::Title).apply(&html, &page()).as_deref(),
            Some("Open Graph Title")
        );
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let html = Html::parse_document("<body><h1> Heading </h1></body>");
        assert_eq!(rule(Field::Title).apply(&html, &page()).as_deref(), Some("Heading"));
    }

    #[test]
    fn test_url_fields_resolved_against_page() {
        let html = Html::parse_document(
            r#"<head>
                <meta property="og:image" content="/images/cover.png">
                <link rel="icon" href="favicon.ico">
            </head>"#,
        );
        assert_eq!(
            rule(Field::Image).apply(&html, &page()).as_deref(),
            Some("https://example.com/images/cover.png")
        );
        assert_eq!(
            rule(Field::Logo).apply(&html, &page()).as_deref(),
            Some("https://example.com/blog/favicon.ico")
        );
    }

    #[test]
    fn test_icon_matches_any_rel_token() {
        for rel in ["icon", "shortcut icon", "icon shortcut", "alternate icon"] {
            let html = Html::parse_document(&format!(r#"<head><link rel="{rel}" href="/f.ico"></head>"#));
            assert_eq!(
                rule(Field::Logo).apply(&html, &page()).as_deref(),
                Some("https://example.com/f.ico"),
                "rel={rel}"
            );
        }
    }

    #[test]
    fn test_non_http_urls_skipped() {
        let html = Html::parse_document(
            r#"<head>
                <meta property="og:image" content="javascript:alert(1)">
                <meta name="twitter:image" content="https://cdn.example.com/a.png">
            </head>"#,
        );
        assert_eq!(
            rule(Field::Image).apply(&html, &page()).as_deref(),
            Some("https://cdn.example.com/a.png")
        );
    }

    #[test]
    fn test_author_rejects_url_values() {
        let html = Html::parse_document(
            r#"<head>
                <meta name="author" content="https://facebook.com/someone">
                <meta property="article:author" content="Jane Writer">
            </head>"#,
        );
        assert_eq!(
            rule(Field::Author).apply(&html, &page()).as_deref(),
            Some("Jane Writer")
        );
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
