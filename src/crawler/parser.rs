//! Anchor extraction from HTML page text
//!
//! Returns the raw (possibly relative) href targets of anchor elements in
//! document order. Resolution against the page URL happens in the traversal
//! engine, not here.

use scraper::{Html, Selector};

/// Extracts raw href targets from anchor elements in document order
///
/// Anchors with a missing or empty href are skipped, as are targets that can
/// never resolve to an addressable page (fragment-only anchors, `javascript:`,
/// `mailto:`, `tel:`, `data:`). Malformed markup is not an error; the parser
/// recovers and extracts what it can.
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| is_addressable(href))
        .map(str::to_string)
        .collect()
}

fn is_addressable(href: &str) -> bool {
    !href.is_empty()
        && !href.starts_with('#')
        && !href.starts_with("javascript:")
        && !href.starts_with("mailto:")
        && !href.starts_with("tel:")
        && !href.starts_with("data:")
}
