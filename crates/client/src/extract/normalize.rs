//! Field normalization for extracted product data.

use scraper::ElementRef;

/// Element text with every text node trimmed and concatenated.
pub fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Product name as matched against queries: stripped text, lowercased.
pub fn normalize_name(element: ElementRef<'_>) -> String {
    stripped_text(element).to_lowercase()
}

/// Parse a local-format price such as `$1.234,50`.
///
/// Strips `$`, drops `.` thousands separators and turns the `,` decimal
/// separator into `.`. Anything that does not parse to a finite,
/// non-negative number becomes 0.0 so the product is still listed.
pub fn parse_price(raw: &str) -> f64 {
    let cleaned = raw.replace('$', "").replace('.', "").replace(',', ".");

    match cleaned.trim().parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => price,
        _ => {
            tracing::debug!(raw, "unparseable price, using 0.0");
            0.0
        }
    }
}
