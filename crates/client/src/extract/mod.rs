//! Product extraction from retailer pages.
//!
//! A page yields at most one [`ProductRecord`]: the first element matching
//! each of the rule's name, price and image locators. A page missing any of
//! them (or an image without `src`) yields nothing, which is how upstream
//! markup changes surface: fewer records, never an error.

pub mod normalize;
pub mod rules;

pub use normalize::{normalize_name, parse_price, stripped_text};
pub use rules::{ExtractionRule, RuleSet, SourceKind};

use scraper::Html;
use shelfscan_core::{ProductRecord, Query};

/// Result of running one rule over one page.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// All fields found and the name matched the query.
    Matched(ProductRecord),
    /// All fields found but the name does not contain the query.
    Filtered,
    /// At least one locator found nothing.
    Miss,
}

impl Extraction {
    pub fn into_record(self) -> Option<ProductRecord> {
        match self {
            Extraction::Matched(record) => Some(record),
            Extraction::Filtered | Extraction::Miss => None,
        }
    }
}

/// Extract and filter a product from `html` using `rule`.
pub fn extract(rule: &ExtractionRule, url: &str, html: &str, query: &Query) -> Option<ProductRecord> {
    classify(rule, url, html, query).into_record()
}

/// Like [`extract`], but reports why no record was produced.
pub fn classify(rule: &ExtractionRule, url: &str, html: &str, query: &Query) -> Extraction {
    let document = Html::parse_document(html);

    let (Some(name_el), Some(price_el), Some(image_el)) = (
        document.select(&rule.name).next(),
        document.select(&rule.price).next(),
        document.select(&rule.image).next(),
    ) else {
        return Extraction::Miss;
    };

    let Some(image) = image_el.value().attr("src") else {
        return Extraction::Miss;
    };

    let name = normalize_name(name_el);
    if !query.matches(&name) {
        return Extraction::Filtered;
    }

    let price = parse_price(&stripped_text(price_el));

    Extraction::Matched(ProductRecord {
        name,
        price,
        store: rule.label.clone(),
        url: url.to_string(),
        image: image.to_string(),
    })
}
