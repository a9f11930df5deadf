//! Parsed HTML pages.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// One fetched and parsed HTML document together with the URL it came from.
///
/// Pages are consumed by a single extraction step and then dropped; they are
/// never held across a network await.
pub struct Page {
    url: Url,
    html: Html,
}

impl Page {
    pub fn parse(url: Url, body: &str) -> Self {
        Self {
            url,
            html: Html::parse_document(body),
        }
    }

    /// The page's own URL, used as the base for relative links.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// First element matching `selector` in document order.
    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// All elements matching `selector` in document order.
    pub fn select_all<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html.select(selector)
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page").field("url", &self.url.as_str()).finish()
    }
}

/// Visible text of an element with whitespace runs collapsed and trimmed.
pub fn element_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
