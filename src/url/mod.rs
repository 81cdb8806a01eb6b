//! URL handling module for Programme-Harvest
//!
//! This module provides canonical work-item keys, relative-link resolution
//! against the configured origin, and construction of numbered listing pages.

mod normalize;

pub use normalize::{canonical_key, resolve_href};

use crate::UrlError;
use url::Url;

/// Builds the URL of a numbered listing page
///
/// Any existing value of `page_param` is replaced so the same listing URL can
/// be reused for every page number; other query parameters are kept in order.
///
/// # Examples
///
/// ```
/// use programme_harvest::url::listing_page_url;
///
/// let url = listing_page_url("https://example.com/list?limit=100", "p", 3).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/list?limit=100&p=3");
/// ```
pub fn listing_page_url(listing_url: &str, page_param: &str, page: u32) -> Result<Url, UrlError> {
    let mut url = Url::parse(listing_url).map_err(|e| UrlError::Parse(e.to_string()))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != page_param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(page_param, &page.to_string());

    Ok(url)
}

/// Parses the configured base origin
pub fn parse_origin(origin: &str) -> Result<Url, UrlError> {
    let url = Url::parse(origin).map_err(|e| UrlError::Parse(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_page_url_appends_param() {
        let url = listing_page_url(
            "https://www.daad.de/en/all-degree-programmes/?hec-limit=100",
            "hec-p",
            1,
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.daad.de/en/all-degree-programmes/?hec-limit=100&hec-p=1"
        );
    }

    #[test]
    fn test_listing_page_url_replaces_existing_param() {
        let url = listing_page_url("https://example.com/list?p=9&limit=10", "p", 2).unwrap();
        assert_eq!(url.as_str(), "https://example.com/list?limit=10&p=2");
    }

    #[test]
    fn test_listing_page_url_without_query() {
        let url = listing_page_url("https://example.com/list", "page", 7).unwrap();
        assert_eq!(url.as_str(), "https://example.com/list?page=7");
    }

    #[test]
    fn test_parse_origin() {
        assert!(parse_origin("https://www.daad.de").is_ok());
        assert!(parse_origin("nonsense").is_err());
        assert!(matches!(
            parse_origin("ftp://www.daad.de"),
            Err(UrlError::InvalidScheme(_))
        ));
    }
}
