//! `url(...)` / `@import "..."` rewriting for inline `style` attributes,
//! `<style>` bodies, and standalone saved CSS files (SPEC_FULL §4.7).

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::resolve::{resolve_target, to_relative};

static URL_FN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"url\(\s*(['"]?)([^'"\)]+)\1\s*\)"#).expect("static regex"));

static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@import\s+(?:url\(\s*)?['"]([^'"]+)['"]\s*\)?"#).expect("static regex")
});

/// Rewrites every `url()`/`@import` target in `css`, resolving relative to
/// `source_url` (the CSS's own URL, for absolutizing references) and
/// producing paths relative to `local_path` (where this CSS lives on disk).
#[must_use]
pub fn rewrite_css(
    css: &str,
    source_url: &Url,
    local_path: &str,
    url_map: &DashMap<String, String>,
) -> String {
    let resolve = |raw: &str| -> Option<String> {
        let target = raw.trim();
        if target.is_empty() || target.starts_with("data:") {
            return None;
        }
        let abs = source_url.join(target).ok()?;
        let saved = resolve_target(url_map, &abs)?;
        Some(to_relative(local_path, &saved))
    };

    let after_import = IMPORT.replace_all(css, |caps: &regex::Captures| {
        let whole = &caps[0];
        match resolve(&caps[1]) {
            Some(rel) if whole.trim_start().starts_with("@import url(") => {
                format!("@import url(\"{rel}\")")
            }
            Some(rel) => format!("@import \"{rel}\""),
            None => whole.to_string(),
        }
    });

    URL_FN
        .replace_all(&after_import, |caps: &regex::Captures| match resolve(&caps[2]) {
            Some(rel) => format!("url(\"{rel}\")"),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::normalize;

    #[test]
    fn rewrites_url_function() {
        let map = DashMap::new();
        map.insert(normalize("https://e.com/img/bg.png"), "e.com/img/bg.png".to_string());
        let source = Url::parse("https://e.com/css/app.css").unwrap();
        let css = "body { background: url(\"../img/bg.png\"); }";
        let out = rewrite_css(css, &source, "e.com/css/app.css", &map);
        assert_eq!(out, "body { background: url(\"../img/bg.png\"); }");
    }

    #[test]
    fn rewrites_import_statement() {
        let map = DashMap::new();
        map.insert(normalize("https://e.com/css/base.css"), "e.com/css/base.css".to_string());
        let source = Url::parse("https://e.com/css/app.css").unwrap();
        let css = "@import \"base.css\";";
        let out = rewrite_css(css, &source, "e.com/css/app.css", &map);
        assert_eq!(out, "@import \"./base.css\";");
    }

    #[test]
    fn unresolvable_target_left_untouched() {
        let map = DashMap::new();
        let source = Url::parse("https://e.com/css/app.css").unwrap();
        let css = "body { background: url(\"https://cdn.other.com/x.png\"); }";
        let out = rewrite_css(css, &source, "e.com/css/app.css", &map);
        assert_eq!(out, css);
    }
}
