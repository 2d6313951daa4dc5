//! Merge per-source results into one price-sorted list.

use shelfscan_core::ProductRecord;

/// Concatenate `per_source` in the given order, then stable-sort by price.
///
/// Equal prices keep their concatenation order. No deduplication.
pub fn aggregate(per_source: Vec<Vec<ProductRecord>>) -> Vec<ProductRecord> {
    let mut products: Vec<ProductRecord> = per_source.into_iter().flatten().collect();
    products.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal));
    products
}
