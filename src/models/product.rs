//! Product records extracted from catalog detail pages.
//!
//! A record is built once per successfully extracted detail page and handed
//! to a sink; nothing here is kept around after persistence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A labelled link discovered on a catalog page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    pub label: String,
    /// Absolute URL, resolved against the page the link was found on.
    pub target_url: String,
}

impl LinkRef {
    pub fn new(label: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target_url: target_url.into(),
        }
    }
}

/// Flat specification map of normalized key to trimmed value.
///
/// Insertion order follows document order; a later insert for the same key
/// replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecMap(BTreeMap<String, String>);

impl SpecMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, overwriting any previous value for `key`.
    /// Empty keys are ignored. Returns true if the entry was stored.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if key.is_empty() {
            return false;
        }
        self.0.insert(key, value.into());
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SpecMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = SpecMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// One product's flattened specification record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    manufacturer: String,
    product: String,
    source_url: String,
    specs: SpecMap,
}

impl Record {
    /// Build a record from the manufacturer context, the product link it was
    /// discovered through, and the extracted specifications.
    pub fn new(manufacturer: &str, product: &LinkRef, specs: SpecMap) -> Self {
        Self {
            manufacturer: manufacturer.to_string(),
            product: product.label.clone(),
            source_url: product.target_url.clone(),
            specs,
        }
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn specs(&self) -> &SpecMap {
        &self.specs
    }

    /// Logical document shape handed to persistence.
    pub fn to_document(&self) -> ProductDocument {
        ProductDocument {
            manufacturer: self.manufacturer.clone(),
            model: self.product.clone(),
            url: self.source_url.clone(),
            specifications: self.specs.clone(),
        }
    }
}

/// Persisted product document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDocument {
    pub manufacturer: String,
    pub model: String,
    pub url: String,
    pub specifications: SpecMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_map_last_write_wins() {
        let mut specs = SpecMap::new();
        specs.insert("display_type", "LCD");
        specs.insert("display_type", "AMOLED");
        assert_eq!(specs.len(), 1);
        assert_eq!(specs.get("display_type"), Some("AMOLED"));
    }

    #[test]
    fn test_spec_map_rejects_empty_key() {
        let mut specs = SpecMap::new();
        assert!(!specs.insert("", "value"));
        assert!(specs.is_empty());
    }

    #[test]
    fn test_document_shape() {
        let link = LinkRef::new("Galaxy S24", "https://example.com/galaxy_s24.php");
        let specs: SpecMap = [("phone_name", "Samsung Galaxy S24")].into_iter().collect();
        let record = Record::new("Samsung", &link, specs);

        let json = serde_json::to_value(record.to_document()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "manufacturer": "Samsung",
                "model": "Galaxy S24",
                "url": "https://example.com/galaxy_s24.php",
                "specifications": {"phone_name": "Samsung Galaxy S24"}
            })
        );
    }
}
