//! Small DOM helpers shared by the listing and detail extractors
//!
//! All lookups return `Option` so a missing element short-circuits to "unset"
//! instead of failing the whole page.

use scraper::{ElementRef, Html, Selector};

/// Parses a CSS selector
///
/// Selectors in this crate are literals, so a parse failure can only mean a
/// typo; it is treated like an element that is not on the page.
pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Concatenates the trimmed, non-empty text nodes below `element`
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<String>()
}

/// Like [`text_of`], but `None` for elements with no visible text
pub(crate) fn text_opt(element: ElementRef<'_>) -> Option<String> {
    let text = text_of(element);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// First element in the document matching `css`
pub(crate) fn first_in_document<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    document.select(&sel).next()
}

/// First descendant of `element` matching `css`
pub(crate) fn first_in<'a>(element: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    element.select(&sel).next()
}

/// All descendants of `element` matching `css`, in document order
pub(crate) fn all_in<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(sel) => element.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// The next sibling that is an element, skipping text and comments
pub(crate) fn next_element_sibling(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

/// The next sibling element with the given tag name
pub(crate) fn next_sibling_named<'a>(element: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == tag)
}

/// Returns true if `tag` is the element's tag name
pub(crate) fn is_tag(element: ElementRef<'_>, tag: &str) -> bool {
    element.value().name() == tag
}

/// The `href` attribute, if present and non-empty
pub(crate) fn href_of(element: ElementRef<'_>) -> Option<String> {
    element
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

/// Case-insensitive substring match of a heading against a field label
pub(crate) fn label_matches(heading: &str, label: &str) -> bool {
    heading.to_lowercase().contains(&label.to_lowercase())
}

/// Undoes the upstream's e-mail obfuscation
///
/// Addresses are rendered as `"name at example.org"`; exactly the token
/// `" at "` is replaced, nothing else.
pub(crate) fn deobfuscate_email(text: &str) -> String {
    text.replace(" at ", "@")
}
