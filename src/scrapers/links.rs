//! Link discovery on catalog listing pages.

use scraper::Selector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::page::{element_text, Page};
use crate::models::LinkRef;

/// A selector profile could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector '{selector}': {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

/// Structural path to the anchors of a listing page:
/// container, then list, then list item, then anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorProfileConfig {
    pub container: String,
    #[serde(default = "default_list")]
    pub list: String,
    #[serde(default = "default_item")]
    pub item: String,
    #[serde(default = "default_anchor")]
    pub anchor: String,
}

fn default_list() -> String {
    "ul".to_string()
}

fn default_item() -> String {
    "li".to_string()
}

fn default_anchor() -> String {
    "a".to_string()
}

impl SelectorProfileConfig {
    pub fn new(container: &str, list: &str, item: &str, anchor: &str) -> Self {
        Self {
            container: container.to_string(),
            list: list.to_string(),
            item: item.to_string(),
            anchor: anchor.to_string(),
        }
    }

    /// Manufacturer list on the top-level catalog page.
    pub fn manufacturers() -> Self {
        Self::new("div.makers", "ul", "li", "a")
    }

    /// Product list on a manufacturer page.
    pub fn products() -> Self {
        Self::new("div.section-body", "ul", "li", "a")
    }

    /// Descendant-combined CSS for the whole path.
    pub fn css(&self) -> String {
        [&self.container, &self.list, &self.item, &self.anchor]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn compile(&self) -> Result<SelectorProfile, SelectorError> {
        SelectorProfile::parse(&self.css())
    }
}

/// A compiled anchor selector.
#[derive(Debug, Clone)]
pub struct SelectorProfile {
    css: String,
    selector: Selector,
}

impl SelectorProfile {
    pub fn parse(css: &str) -> Result<Self, SelectorError> {
        let selector = Selector::parse(css).map_err(|e| SelectorError {
            selector: css.to_string(),
            reason: format!("{:?}", e),
        })?;
        Ok(Self {
            css: css.to_string(),
            selector,
        })
    }

    pub fn css(&self) -> &str {
        &self.css
    }
}

/// Collect labelled links matching `profile`, in document order.
///
/// A page that does not have the expected structure yields an empty list.
/// Anchors without a resolvable `href` are skipped.
pub fn extract_links(page: &Page, profile: &SelectorProfile) -> Vec<LinkRef> {
    page.select_all(&profile.selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let target = page.url().join(href.trim()).ok()?;
            Some(LinkRef::new(element_text(anchor), target.to_string()))
        })
        .collect()
}
