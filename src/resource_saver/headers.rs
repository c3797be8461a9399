use std::collections::HashMap;

/// Extracts and normalizes the `ETag` from a response header map, stripping
/// the weak-validator `W/` prefix used by reverse proxies.
#[must_use]
pub fn extract_etag(headers: &HashMap<String, String>) -> Option<String> {
    headers.iter().find_map(|(k, v)| {
        if k.eq_ignore_ascii_case("etag") {
            Some(v.strip_prefix("W/").unwrap_or(v).to_string())
        } else {
            None
        }
    })
}

#[must_use]
pub fn extract_last_modified(headers: &HashMap<String, String>) -> Option<String> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("last-modified"))
        .map(|(_, v)| v.clone())
}

#[must_use]
pub fn extract_content_type(headers: &HashMap<String, String>) -> Option<String> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
        .map(|(_, v)| v.clone())
}
