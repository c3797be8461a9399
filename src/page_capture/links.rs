//! Extracts candidate page and asset links from a captured page's DOM
//! (SPEC_FULL §4.6.1), resolving everything against `final_url`.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::canonical::{classify, Classification};

static URL_FN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"url\(\s*(['"]?)([^'"\)]+)\1\s*\)"#).expect("static regex"));
static IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@import\s+(?:url\(\s*)?['"]([^'"]+)['"]\s*\)?"#).expect("static regex"));

/// Every URL reachable from a page, split by what it's classified as.
#[derive(Debug, Default, Clone)]
pub struct ExtractedLinks {
    pub pages: Vec<String>,
    pub assets: Vec<String>,
}

impl ExtractedLinks {
    fn push(&mut self, url: String, force_asset: bool) {
        if force_asset || matches!(classify(&url), Classification::Asset) {
            self.assets.push(url);
        } else {
            self.pages.push(url);
        }
    }

    fn dedup(mut self) -> Self {
        dedup_in_place(&mut self.pages);
        dedup_in_place(&mut self.assets);
        self
    }
}

fn dedup_in_place(v: &mut Vec<String>) {
    let mut seen = HashSet::new();
    v.retain(|u| seen.insert(u.clone()));
}

fn has_skip_prefix(value: &str) -> bool {
    const SKIP: &[&str] = &["javascript:", "mailto:", "tel:", "data:", "blob:", "about:", "#"];
    let trimmed = value.trim_start();
    SKIP.iter().any(|p| trimmed.starts_with(p))
}

fn resolve(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || has_skip_prefix(raw) {
        return None;
    }
    let abs = base.join(raw).ok()?;
    matches!(abs.scheme(), "http" | "https").then(|| abs.to_string())
}

fn first_srcset_url(entry: &str) -> &str {
    entry.trim().split_whitespace().next().unwrap_or("")
}

/// Parses `html` (already resolved to `final_url`) into page and asset
/// candidate link sets.
#[must_use]
pub fn extract(html: &str, final_url: &Url) -> ExtractedLinks {
    let document = Html::parse_document(html);
    let mut out = ExtractedLinks::default();

    let sel = |s: &str| Selector::parse(s).expect("static selector");

    for el in document.select(&sel("a[href]")) {
        if let Some(url) = el.value().attr("href").and_then(|h| resolve(final_url, h)) {
            out.push(url, false);
        }
    }

    for el in document.select(&sel("link[href]")) {
        let rel = el.value().attr("rel").unwrap_or_default().to_ascii_lowercase();
        if rel.split_whitespace().any(|r| matches!(r, "stylesheet" | "icon" | "preload" | "prefetch")) {
            if let Some(url) = el.value().attr("href").and_then(|h| resolve(final_url, h)) {
                out.push(url, true);
            }
        }
        if rel == "canonical" {
            if let Some(url) = el.value().attr("href").and_then(|h| resolve(final_url, h)) {
                out.push(url, false);
            }
        }
    }

    for (selector, attr) in [
        ("script[src]", "src"),
        ("img[src]", "src"),
        ("img[data-src]", "data-src"),
        ("object[data]", "data"),
        ("video[src]", "src"),
        ("video[poster]", "poster"),
        ("audio[src]", "src"),
        ("source[src]", "src"),
        ("image[href]", "href"),
        ("image[xlink\\:href]", "xlink:href"),
        ("use[href]", "href"),
        ("use[xlink\\:href]", "xlink:href"),
        ("feImage[href]", "href"),
        ("feImage[xlink\\:href]", "xlink:href"),
    ] {
        for el in document.select(&sel(selector)) {
            if let Some(url) = el.value().attr(attr).and_then(|h| resolve(final_url, h)) {
                out.push(url, true);
            }
        }
    }

    // `<iframe src>` is both an asset-like capture target and a page candidate.
    for el in document.select(&sel("iframe[src]")) {
        if let Some(url) = el.value().attr("src").and_then(|h| resolve(final_url, h)) {
            out.assets.push(url.clone());
            out.pages.push(url);
        }
    }

    for selector in ["img[srcset]", "source[srcset]"] {
        for el in document.select(&sel(selector)) {
            if let Some(srcset) = el.value().attr("srcset") {
                for entry in srcset.split(',') {
                    if let Some(url) = resolve(final_url, first_srcset_url(entry)) {
                        out.push(url, true);
                    }
                }
            }
        }
    }

    for el in document.select(&sel("meta[http-equiv]")) {
        let equiv = el.value().attr("http-equiv").unwrap_or_default();
        if equiv.eq_ignore_ascii_case("refresh") {
            if let Some(content) = el.value().attr("content") {
                if let Some((_, target)) = content.split_once('=') {
                    if let Some(url) = resolve(final_url, target.trim()) {
                        out.push(url, false);
                    }
                }
            }
        }
    }

    for el in document.select(&sel("[style]")) {
        if let Some(style) = el.value().attr("style") {
            extract_css_urls(style, final_url, &mut out);
        }
    }
    for el in document.select(&sel("style")) {
        extract_css_urls(&el.text().collect::<String>(), final_url, &mut out);
    }

    out.dedup()
}

fn extract_css_urls(css: &str, base: &Url, out: &mut ExtractedLinks) {
    for caps in URL_FN.captures_iter(css) {
        if let Some(url) = resolve(base, &caps[2]) {
            out.push(url, true);
        }
    }
    for caps in IMPORT.captures_iter(css) {
        if let Some(url) = resolve(base, &caps[1]) {
            out.push(url, true);
        }
    }
}
