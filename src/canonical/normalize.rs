use url::Url;

/// Normalizes a URL to a stable canonical string.
///
/// Strips a trailing `/` from any non-root path, strips the scheme's default
/// port, sorts query parameters lexicographically by name (preserving
/// duplicates), and drops the fragment. Parse failures are returned
/// unchanged so callers can still log the offending string.
#[must_use]
pub fn normalize(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    parsed.set_fragment(None);

    if let Some(port) = parsed.port()
        && Some(port) == default_port(parsed.scheme())
    {
        let _ = parsed.set_port(None);
    }

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if !pairs.is_empty() {
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query));
    } else {
        parsed.set_query(None);
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    parsed.into()
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}
