//! Scraper-backed document queries shared by engine implementations
//!
//! These helpers turn raw HTML plus a selector into [`ElementSnapshot`]
//! values. Parsing happens per query; the snapshot owns everything it needs,
//! so no DOM state outlives the call.

use scraper::{ElementRef, Html, Selector};

use super::ElementSnapshot;

/// First match of `selector` in a full HTML document
pub(crate) fn query_document_one(html: &str, selector: &str) -> Option<ElementSnapshot> {
    let document = Html::parse_document(html);
    let selector = parse_selector(selector)?;
    document.select(&selector).next().map(snapshot)
}

/// All matches of `selector` in a full HTML document, in document order
pub(crate) fn query_document_all(html: &str, selector: &str) -> Vec<ElementSnapshot> {
    let document = Html::parse_document(html);
    let Some(selector) = parse_selector(selector) else {
        return Vec::new();
    };
    document.select(&selector).map(snapshot).collect()
}

/// All elements of `tag` in a full HTML document whose text contains `needle`
pub(crate) fn query_document_by_text(html: &str, tag: &str, needle: &str) -> Vec<ElementSnapshot> {
    let document = Html::parse_document(html);
    let Some(selector) = parse_selector(tag) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter(|element| collect_text(element).contains(needle))
        .map(snapshot)
        .collect()
}

/// First match of `selector` in an HTML fragment
pub(crate) fn query_fragment_one(html: &str, selector: &str) -> Option<ElementSnapshot> {
    let fragment = Html::parse_fragment(html);
    let selector = parse_selector(selector)?;
    fragment.select(&selector).next().map(snapshot)
}

/// All matches of `selector` in an HTML fragment, in document order
pub(crate) fn query_fragment_all(html: &str, selector: &str) -> Vec<ElementSnapshot> {
    let fragment = Html::parse_fragment(html);
    let Some(selector) = parse_selector(selector) else {
        return Vec::new();
    };
    fragment.select(&selector).map(snapshot).collect()
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(error) => {
            tracing::warn!("Invalid selector '{}': {}", selector, error);
            None
        }
    }
}

fn snapshot(element: ElementRef) -> ElementSnapshot {
    ElementSnapshot::new(
        element.value().name().to_string(),
        collect_text(&element),
        element.inner_html(),
        element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
    )
}

/// Collects an element's text with runs of whitespace collapsed to one space
fn collect_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
