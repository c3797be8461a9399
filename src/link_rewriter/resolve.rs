//! URL → relative-path resolution shared by the HTML and CSS rewriters.

use std::path::Path;

use dashmap::DashMap;
use url::Url;

use crate::canonical::normalize;

/// Candidate normalized forms to probe the URL map with, in lookup order
/// (SPEC_FULL §4.7): the URL itself, without a trailing slash, with an
/// implicit `index.html`, and without its query string.
fn candidates(abs: &Url) -> Vec<String> {
    let full = abs.as_str().to_string();
    let mut out = vec![full.clone()];

    if let Some(stripped) = full.strip_suffix('/') {
        out.push(stripped.to_string());
        out.push(format!("{full}index.html"));
    }

    if abs.query().is_some() {
        let mut no_query = abs.clone();
        no_query.set_query(None);
        out.push(no_query.as_str().to_string());
    }

    out
}

/// Looks up the saved local path for an absolute URL, trying each candidate
/// form in turn. `url_map` holds `canonical::normalize`d keys.
#[must_use]
pub fn resolve_target(url_map: &DashMap<String, String>, abs: &Url) -> Option<String> {
    candidates(abs)
        .iter()
        .find_map(|candidate| url_map.get(&normalize(candidate)).map(|e| e.value().clone()))
}

/// Computes the POSIX relative path from the directory containing
/// `page_local_path` to `target_local_path`, prefixing `./` when the result
/// doesn't already start with `.` or `/`.
#[must_use]
pub fn to_relative(page_local_path: &str, target_local_path: &str) -> String {
    let page_dir = Path::new(page_local_path).parent().unwrap_or_else(|| Path::new(""));
    let rel = pathdiff::diff_paths(target_local_path, page_dir)
        .unwrap_or_else(|| std::path::PathBuf::from(target_local_path));
    let mut s = rel.to_string_lossy().replace('\\', "/");
    if !s.starts_with('.') && !s.starts_with('/') {
        s = format!("./{s}");
    }
    s
}

/// `true` when `value` starts with a protocol the rewriter must never touch.
#[must_use]
pub fn has_skip_prefix(value: &str) -> bool {
    const SKIP: &[&str] = &["javascript:", "mailto:", "tel:", "data:", "blob:", "about:", "#"];
    let trimmed = value.trim_start();
    SKIP.iter().any(|p| trimmed.starts_with(p))
}
