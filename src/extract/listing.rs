//! Listing-page extraction
//!
//! A listing page shows one card per programme. Each card carries a
//! "more info" anchor identified by a fixed set of CSS classes; that anchor
//! gives the detail URL and, via its screen-reader label, the programme name.

use crate::extract::dom::{first_in, href_of, selector, text_of};
use crate::record::ListingRecord;
use crate::url::resolve_href;
use scraper::Html;
use url::Url;

/// Classes that must all be present on a card's "more info" anchor
const MORE_LINK_CLASSES: [&str; 8] = [
    "link",
    "link--nowrap",
    "u-stretched-link",
    "u-position-static",
    "result__link",
    "qa-more-link",
    "u-text-primary",
    "u-font-italic",
];

/// Prefix of the accessibility label in front of the programme name
const NAME_PREFIX: &str = "More about ";

/// Extracts every programme card from a parsed listing page
///
/// Anchors without an `href` (or with one that cannot be resolved to http(s))
/// are skipped. Relative hrefs are resolved against `base`.
pub fn extract_listing_records(document: &Html, base: &Url) -> Vec<ListingRecord> {
    let css = format!("a.{}", MORE_LINK_CLASSES.join("."));
    let Some(anchor_selector) = selector(&css) else {
        return Vec::new();
    };

    let mut records = Vec::new();

    for anchor in document.select(&anchor_selector) {
        let Some(href) = href_of(anchor) else {
            continue;
        };

        let Some(url) = resolve_href(base, &href) else {
            tracing::debug!("Skipping unresolvable listing href: {}", href);
            continue;
        };

        let label = match first_in(anchor, "span.sr-only") {
            Some(sr_only) => text_of(sr_only),
            None => text_of(anchor),
        };
        let name = strip_name_prefix(&label);

        records.push(ListingRecord { name, url });
    }

    records
}

fn strip_name_prefix(label: &str) -> String {
    label
        .strip_prefix(NAME_PREFIX)
        .unwrap_or(label)
        .trim()
        .to_string()
}
