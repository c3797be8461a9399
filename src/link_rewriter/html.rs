//! Streaming HTML attribute rewriting over the full link-bearing attribute
//! table of SPEC_FULL §4.7.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use dashmap::DashMap;
use lol_html::html_content::{ContentType, Element};
use lol_html::{element, text, HtmlRewriter, Settings};
use url::Url;

use super::css::rewrite_css;
use super::resolve::{has_skip_prefix, resolve_target, to_relative};

/// Event-handler attributes stripped when `strip_scripts` is set.
const EVENT_ATTRS: &[&str] = &[
    "onclick", "onload", "onerror", "onmouseover", "onmouseout", "onkeydown", "onkeyup",
    "onsubmit", "onchange", "onfocus", "onblur",
];

/// Attributes carrying a single URL, by CSS selector.
const URL_ATTRS: &[(&str, &str)] = &[
    ("a[href]", "href"),
    ("link[href]", "href"),
    ("script[src]", "src"),
    ("img[src]", "src"),
    ("iframe[src]", "src"),
    ("object[data]", "data"),
    ("video[src]", "src"),
    ("video[poster]", "poster"),
    ("audio[src]", "src"),
    ("source[src]", "src"),
    ("use[href]", "href"),
    ("use[xlink\\:href]", "xlink:href"),
    ("image[href]", "href"),
    ("image[xlink\\:href]", "xlink:href"),
    ("feImage[href]", "href"),
    ("feImage[xlink\\:href]", "xlink:href"),
];

/// Attributes carrying a comma-separated list of URLs with descriptors.
const SRCSET_SELECTORS: &[&str] = &["img[srcset]", "source[srcset]"];

fn rewrite_url_attr(
    el: &mut Element,
    attr: &str,
    page_url: &Url,
    page_path: &str,
    url_map: &DashMap<String, String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(value) = el.get_attribute(attr) else {
        return Ok(());
    };
    if has_skip_prefix(&value) {
        return Ok(());
    }
    let Ok(abs) = page_url.join(&value) else {
        return Ok(());
    };
    if let Some(target) = resolve_target(url_map, &abs) {
        el.set_attribute(attr, &to_relative(page_path, &target))?;
    }
    Ok(())
}

fn rewrite_srcset(
    el: &mut Element,
    page_url: &Url,
    page_path: &str,
    url_map: &DashMap<String, String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(value) = el.get_attribute("srcset") else {
        return Ok(());
    };
    let rewritten = value
        .split(',')
        .map(|entry| {
            let entry = entry.trim();
            let mut parts = entry.splitn(2, char::is_whitespace);
            let url_part = parts.next().unwrap_or("");
            let descriptor = parts.next();
            let new_url = if has_skip_prefix(url_part) {
                url_part.to_string()
            } else {
                page_url
                    .join(url_part)
                    .ok()
                    .and_then(|abs| resolve_target(url_map, &abs))
                    .map(|target| to_relative(page_path, &target))
                    .unwrap_or_else(|| url_part.to_string())
            };
            match descriptor {
                Some(d) => format!("{new_url} {d}"),
                None => new_url,
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    el.set_attribute("srcset", &rewritten)?;
    Ok(())
}

/// Rewrites every link-bearing attribute, inline `style` values, and
/// `<style>` bodies in `html` against `url_map`, optionally stripping
/// scripts and event handlers (SPEC_FULL §4.7).
pub fn rewrite_html(
    html: &str,
    page_url: &Url,
    page_path: &str,
    url_map: &DashMap<String, String>,
    strip_scripts: bool,
) -> Result<String> {
    let mut output = Vec::with_capacity(html.len());
    let style_buffer = Rc::new(RefCell::new(String::new()));

    let mut handlers = Vec::new();

    for (selector, attr) in URL_ATTRS {
        let page_url = page_url.clone();
        let page_path = page_path.to_string();
        let attr = (*attr).to_string();
        handlers.push(element!(*selector, move |el| {
            rewrite_url_attr(el, &attr, &page_url, &page_path, url_map)
        }));
    }

    for selector in SRCSET_SELECTORS {
        let page_url = page_url.clone();
        let page_path = page_path.to_string();
        handlers.push(element!(*selector, move |el| {
            rewrite_srcset(el, &page_url, &page_path, url_map)
        }));
    }

    {
        let page_url = page_url.clone();
        let page_path = page_path.to_string();
        handlers.push(element!("[style]", move |el| {
            if let Some(style) = el.get_attribute("style") {
                let rewritten = rewrite_css(&style, &page_url, &page_path, url_map);
                el.set_attribute("style", &rewritten)?;
            }
            Ok(())
        }));
    }

    {
        let page_url = page_url.clone();
        let page_path = page_path.to_string();
        let buffer = style_buffer.clone();
        handlers.push(text!("style", move |chunk| {
            buffer.borrow_mut().push_str(chunk.as_str());
            if chunk.last_in_text_node() {
                let rewritten = rewrite_css(&buffer.borrow(), &page_url, &page_path, url_map);
                chunk.replace(&rewritten, ContentType::Text);
                buffer.borrow_mut().clear();
            } else {
                chunk.remove();
            }
            Ok(())
        }));
    }

    if strip_scripts {
        handlers.push(element!("script", |el| {
            el.remove();
            Ok(())
        }));
        handlers.push(element!("link[rel=\"modulepreload\"]", |el| {
            el.remove();
            Ok(())
        }));
        handlers.push(element!("*", |el| {
            for attr in EVENT_ATTRS {
                el.remove_attribute(attr);
            }
            Ok(())
        }));
    }

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: handlers,
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter.write(html.as_bytes()).map_err(|e| anyhow!("HTML rewrite error: {e}"))?;
    rewriter.end().map_err(|e| anyhow!("HTML rewrite finalization error: {e}"))?;

    String::from_utf8(output).map_err(|e| anyhow!("invalid UTF-8 in rewritten HTML: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::normalize;

    fn map_with(pairs: &[(&str, &str)]) -> DashMap<String, String> {
        let map = DashMap::new();
        for (url, path) in pairs {
            map.insert(normalize(url), (*path).to_string());
        }
        map
    }

    #[test]
    fn rewrites_anchor_href() {
        let map = map_with(&[("https://e.com/about", "e.com/about/index.html")]);
        let page = Url::parse("https://e.com/index.html").unwrap();
        let out = rewrite_html(
            r#"<a href="https://e.com/about">About</a>"#,
            &page,
            "e.com/index.html",
            &map,
            false,
        )
        .unwrap();
        assert!(out.contains(r#"href="about/index.html""#));
    }

    #[test]
    fn leaves_unresolved_external_link_untouched() {
        let map = DashMap::new();
        let page = Url::parse("https://e.com/index.html").unwrap();
        let out = rewrite_html(
            r#"<a href="https://other.com/x">X</a>"#,
            &page,
            "e.com/index.html",
            &map,
            false,
        )
        .unwrap();
        assert!(out.contains(r#"href="https://other.com/x""#));
    }

    #[test]
    fn skip_prefixes_are_never_touched() {
        let map = DashMap::new();
        let page = Url::parse("https://e.com/index.html").unwrap();
        let out = rewrite_html(
            r#"<a href="mailto:a@e.com">Mail</a>"#,
            &page,
            "e.com/index.html",
            &map,
            false,
        )
        .unwrap();
        assert!(out.contains(r#"href="mailto:a@e.com""#));
    }

    #[test]
    fn strip_scripts_removes_script_and_handlers() {
        let map = DashMap::new();
        let page = Url::parse("https://e.com/index.html").unwrap();
        let out = rewrite_html(
            r#"<script>alert(1)</script><button onclick="x()">Go</button>"#,
            &page,
            "e.com/index.html",
            &map,
            true,
        )
        .unwrap();
        assert!(!out.contains("<script>"));
        assert!(!out.contains("onclick"));
    }

    #[test]
    fn rewrites_inline_style_attribute() {
        let map = map_with(&[("https://e.com/img/bg.png", "e.com/img/bg.png")]);
        let page = Url::parse("https://e.com/index.html").unwrap();
        let out = rewrite_html(
            r#"<div style="background: url(img/bg.png)"></div>"#,
            &page,
            "e.com/index.html",
            &map,
            false,
        )
        .unwrap();
        assert!(out.contains(r#"url("img/bg.png")"#));
    }
}
