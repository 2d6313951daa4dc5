//! Product records and the validated search query.

use serde::{Deserialize, Serialize};

use crate::Error;

/// A product found on a retailer page that matched the query.
///
/// Serialized with the field names the search endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Lowercased, trimmed product name.
    pub name: String,
    /// Price in the retailer's currency; 0.0 when the page price was unreadable.
    pub price: f64,
    /// Display label of the source, e.g. "Carrefour".
    pub store: String,
    /// Page the record was extracted from.
    pub url: String,
    /// Product image URL as found on the page.
    pub image: String,
}

/// A non-empty, lowercase substring to match against product names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    /// Normalize and validate a raw query string.
    ///
    /// Trims surrounding whitespace and lowercases. Empty input is rejected.
    pub fn new(raw: &str) -> Result<Self, Error> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(Error::InvalidQuery("Query parameter is required".into()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether an already-lowercased product name contains this query.
    pub fn matches(&self, name: &str) -> bool {
        name.contains(self.0.as_str())
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
