use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentBody {
    Html(String),
    Json(Value),
}

/// A resolved page, independent of how it was obtained.
///
/// HTML is kept as source text and parsed on demand: `scraper::Html` is not
/// `Send`, so a parsed tree must never live across an `.await`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub url: Url,
    pub body: DocumentBody,
}

impl ParsedDocument {
    pub fn html(url: Url, source: impl Into<String>) -> Self {
        Self {
            url,
            body: DocumentBody::Html(source.into()),
        }
    }

    pub fn json(url: Url, value: Value) -> Self {
        Self {
            url,
            body: DocumentBody::Json(value),
        }
    }

    pub fn parse_html(&self) -> Option<Html> {
        match &self.body {
            DocumentBody::Html(source) => Some(Html::parse_document(source)),
            DocumentBody::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match &self.body {
            DocumentBody::Json(value) => Some(value),
            DocumentBody::Html(_) => None,
        }
    }

    /// Whitespace-collapsed text of the first element matching `css`.
    pub fn select_text(&self, css: &str) -> Option<String> {
        let html = self.parse_html()?;
        let selector = Selector::parse(css).ok()?;
        let text = html
            .select(&selector)
            .next()
            .map(element_text)
            .filter(|text| !text.is_empty());
        text
    }
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    let text: String = element.text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve an `href` against the page it was found on. Fragment-only,
/// `javascript:` and `mailto:` references are not product links.
pub(crate) fn resolve_href(reference: &str, base: &Url) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") || lower.starts_with("mailto:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url);
    }
    base.join(trimmed).ok()
}
