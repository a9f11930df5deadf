//! Specification extraction from product detail pages.
//!
//! A detail page carries a title heading, a short "spotlight" list of headline
//! specs, and one or more spec tables. Table rows are grouped visually: a row
//! with a header cell opens a category, and the label/value rows that follow
//! belong to it until the next header. The extractor folds all of this into a
//! flat [`SpecMap`], writing entries in document order so that later entries
//! for the same key win.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::page::{element_text, Page};
use crate::models::SpecMap;

static TITLE: LazyLock<Selector> = LazyLock::new(|| css("h1.specs-phone-name"));
static SPOTLIGHT_ITEMS: LazyLock<Selector> =
    LazyLock::new(|| css("div#specs-list div.specs-spotlight ul li"));
static SPOTLIGHT_LABEL: LazyLock<Selector> = LazyLock::new(|| css("strong"));
static SPOTLIGHT_VALUE: LazyLock<Selector> = LazyLock::new(|| css("span"));
static SPEC_TABLES: LazyLock<Selector> = LazyLock::new(|| css("div#specs-list table"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| css("tr"));
static HEADER_CELL: LazyLock<Selector> = LazyLock::new(|| css("th"));
static LABEL_CELL: LazyLock<Selector> = LazyLock::new(|| css("td.nfo"));
static VALUE_CELL: LazyLock<Selector> = LazyLock::new(|| css("td.vcenter"));

fn css(s: &str) -> Selector {
    Selector::parse(s).unwrap()
}

/// Key under which the page title is stored.
pub const TITLE_KEY: &str = "phone_name";

/// Lowercase and replace spaces with underscores.
pub fn normalize_key(s: &str) -> String {
    s.to_lowercase().replace(' ', "_")
}

/// Key for a table row: the normalized category (if any) and an underscore,
/// followed by the normalized label.
pub fn table_key(category: &str, label: &str) -> String {
    if category.is_empty() {
        normalize_key(label)
    } else {
        format!("{}_{}", normalize_key(category), normalize_key(label))
    }
}

/// Extract the flattened specifications of a detail page.
///
/// A page without any of the expected blocks yields an empty map.
pub fn extract_details(page: &Page) -> SpecMap {
    let mut specs = SpecMap::new();

    if let Some(title) = page.select_first(&TITLE) {
        specs.insert(TITLE_KEY, element_text(title));
    }

    for item in page.select_all(&SPOTLIGHT_ITEMS) {
        extract_spotlight_item(item, &mut specs);
    }

    for table in page.select_all(&SPEC_TABLES) {
        extract_table(table, &mut specs);
    }

    specs
}

fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element.select(selector).next().map(element_text)
}

fn extract_spotlight_item(item: ElementRef<'_>, specs: &mut SpecMap) {
    let label = first_text(item, &SPOTLIGHT_LABEL)
        .map(|l| l.replace(':', "").trim().to_string())
        .unwrap_or_default();
    if label.is_empty() {
        return;
    }
    let value = first_text(item, &SPOTLIGHT_VALUE).unwrap_or_default();
    specs.insert(normalize_key(&label), value);
}

fn extract_table(table: ElementRef<'_>, specs: &mut SpecMap) {
    let mut category = String::new();

    for row in table.select(&ROWS) {
        if let Some(header) = first_text(row, &HEADER_CELL) {
            category = header;
            continue;
        }

        let label = first_text(row, &LABEL_CELL);
        let value = first_text(row, &VALUE_CELL);
        if let (Some(label), Some(value)) = (label, value) {
            // An unlabelled row would leave a bare `category_` key.
            if !label.is_empty() {
                specs.insert(table_key(&category, &label), value);
            }
        }
    }
}
