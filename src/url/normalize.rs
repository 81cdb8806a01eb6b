use crate::UrlError;
use url::Url;

/// Tracking query parameters dropped from canonical keys
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
];

/// Produces the canonical key for a detail-page URL
///
/// # Normalization Steps
///
/// 1. Trim and parse the URL; reject if malformed
/// 2. Require an http(s) scheme and a host (the parser lowercases the host)
/// 3. Remove the fragment
/// 4. Remove tracking query parameters, keeping the remaining order intact
/// 5. Remove the query string if nothing is left of it
///
/// Parameter order is preserved on purpose: the key is also the URL that
/// gets fetched, and the upstream treats its query as opaque.
///
/// # Examples
///
/// ```
/// use programme_harvest::url::canonical_key;
///
/// let key = canonical_key("https://WWW.Example.COM/detail/x/?b=2&utm_source=feed&a=1#top").unwrap();
/// assert_eq!(key, "https://www.example.com/detail/x/?b=2&a=1");
/// ```
pub fn canonical_key(url_str: &str) -> Result<String, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    let has_tracking = url
        .query_pairs()
        .any(|(k, _)| TRACKING_PARAMS.contains(&k.as_ref()));

    // Untouched queries keep their original encoding
    if has_tracking {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    Ok(url.to_string())
}

/// Resolves an `href` against the base origin
///
/// Returns None if the link should be ignored:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: links
/// - anything that does not resolve to http(s)
pub fn resolve_href(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
