use serde::{Deserialize, Serialize};
use url::Url;
use xxhash_rust::xxh3::xxh3_64;

/// How captured URLs are laid out under the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// `host/path/to/page.html`, mirroring the original tree.
    #[default]
    Original,
    /// Every URL flattened into one directory, segments joined with `-`.
    Flat,
    /// Always rooted at `host/`, even when crawling from a subdirectory.
    Domain,
}

/// Replaces filesystem-hostile characters and directory traversal segments.
#[must_use]
pub fn sanitize_component(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for ch in component.chars() {
        match ch {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => out.push('_'),
            c => out.push(c),
        }
    }
    if out == ".." {
        out = "_".to_string();
    }
    out
}

/// Maps a URL to a relative path under the output directory per [`Layout`].
///
/// Does not resolve collisions between two distinct URLs that sanitize to
/// the same path; callers that need uniqueness (the resource saver) track
/// already-reserved paths themselves and append a numeric suffix.
#[must_use]
pub fn url_to_path(url: &Url, layout: Layout) -> String {
    let host = url.host_str().unwrap_or("unknown-host");

    let mut path = url.path().to_string();
    if path.is_empty() || path == "/" {
        path = "/index.html".to_string();
    } else if path.ends_with('/') {
        path.push_str("index.html");
    } else if !path.rsplit('/').next().unwrap_or("").contains('.') {
        path.push_str(".html");
    }

    if url.query().is_some_and(|q| !q.is_empty()) {
        // Sort query pairs the same way `normalize` does, so two URLs that
        // differ only in query parameter order hash to the same suffix
        // regardless of whether the caller already normalized `url`.
        let mut pairs: Vec<(String, String)> =
            url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let sorted_query = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
        let hash = xxh3_64(sorted_query.as_bytes());
        let hash_str = format!("{hash:016x}");
        let short = &hash_str[..8];
        path = splice_before_extension(&path, &format!("-{short}"));
    }

    let sanitized_segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(sanitize_component)
        .collect();

    let relative = match layout {
        Layout::Original => {
            let host = host.strip_prefix("www.").unwrap_or(host);
            let mut segments = vec![sanitize_component(host)];
            segments.extend(sanitized_segments);
            segments.join("/")
        }
        Layout::Domain => {
            let mut segments = vec![sanitize_component(host)];
            segments.extend(sanitized_segments);
            segments.join("/")
        }
        Layout::Flat => {
            let mut flat = sanitized_segments.join("-");
            if flat.starts_with('-') {
                flat = flat.trim_start_matches('-').to_string();
            }
            flat
        }
    };

    truncate_to_bytes(&relative, 200)
}

fn splice_before_extension(path: &str, insert: &str) -> String {
    match path.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}{insert}.{ext}"),
        None => format!("{path}{insert}"),
    }
}

fn truncate_to_bytes(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn root_maps_to_index() {
        assert_eq!(url_to_path(&u("https://e.com/"), Layout::Original), "e.com/index.html");
    }

    #[test]
    fn trailing_slash_gets_index() {
        assert_eq!(url_to_path(&u("https://e.com/docs/"), Layout::Original), "e.com/docs/index.html");
    }

    #[test]
    fn extensionless_page_gets_html_suffix() {
        assert_eq!(url_to_path(&u("https://e.com/about"), Layout::Original), "e.com/about.html");
    }

    #[test]
    fn asset_extension_preserved() {
        assert_eq!(url_to_path(&u("https://e.com/app.css"), Layout::Original), "e.com/app.css");
    }

    #[test]
    fn query_string_spliced_before_extension() {
        let p = url_to_path(&u("https://e.com/search?q=rust"), Layout::Original);
        assert!(p.starts_with("e.com/search-"));
        assert!(p.ends_with(".html"));
    }

    #[test]
    fn query_order_yields_same_path_regardless_of_pre_normalization() {
        // Query pairs are sorted before hashing, so this holds even when the
        // caller passes a raw, non-canonicalized URL.
        let a = url_to_path(&u("https://e.com/s?a=1&b=2"), Layout::Original);
        let b = url_to_path(&u("https://e.com/s?b=2&a=1"), Layout::Original);
        assert_eq!(a, b);
    }

    #[test]
    fn flat_layout_joins_with_dashes() {
        assert_eq!(url_to_path(&u("https://e.com/a/b/c.png"), Layout::Flat), "a-b-c.png");
    }

    #[test]
    fn domain_layout_always_rooted_at_host() {
        assert_eq!(url_to_path(&u("https://e.com/x.png"), Layout::Domain), "e.com/x.png");
    }

    #[test]
    fn www_prefix_stripped_under_original_only() {
        assert_eq!(url_to_path(&u("https://www.e.com/x.png"), Layout::Original), "e.com/x.png");
        assert_eq!(url_to_path(&u("https://www.e.com/x.png"), Layout::Domain), "www.e.com/x.png");
    }

    #[test]
    fn sanitizes_hostile_characters() {
        assert_eq!(sanitize_component("a:b*c?"), "a_b_c_");
        assert_eq!(sanitize_component(".."), "_");
    }
}
