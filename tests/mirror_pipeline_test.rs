//! Integration tests stitching the Resource Saver, Link Rewriter, and
//! Manifest together the way `crawl_engine::orchestrator::process_item`
//! does for one page (SPEC_FULL §4.8 steps 7-9), without driving an actual
//! browser. Covers §8 scenario A (referential closure) and the saver
//! collision invariant (§8 #9).

use std::path::Path;

use smippo::canonical::{url_to_path, Layout};
use smippo::link_rewriter::LinkRewriter;
use smippo::manifest::{AssetRecord, Manifest, OptionsSnapshot, PageRecord};
use smippo::resource_saver::ResourceSaver;
use url::Url;

fn options() -> OptionsSnapshot {
    OptionsSnapshot {
        depth: 0,
        scope: "domain".into(),
        stay_in_dir: false,
        external_assets: false,
        include: vec![],
        exclude: vec![],
    }
}

/// Scenario A: a single page referencing a stylesheet and an image, both
/// saved before the HTML is rewritten; every rewritten reference must
/// resolve to a file that actually exists on disk.
#[tokio::test]
async fn scenario_a_single_page_with_css_and_image() {
    let dir = tempfile::tempdir().unwrap();
    let saver = ResourceSaver::new(dir.path().to_path_buf(), Layout::Original, false, 1_048_576);
    let rewriter = LinkRewriter::new(saver.url_map_handle(), false);
    let mut manifest = Manifest::new("https://example.com/", options());

    let page_url = Url::parse("https://example.com/").unwrap();
    let css_url = Url::parse("https://example.com/s.css").unwrap();
    let img_url = Url::parse("https://example.com/a/logo.png").unwrap();

    let css_rel = saver.save(&css_url, b"body{color:red}".to_vec(), "text/css").await.unwrap();
    let img_rel = saver.save(&img_url, vec![0x89, 0x50, 0x4e, 0x47], "image/png").await.unwrap();
    manifest.record_asset(AssetRecord {
        url: css_url.to_string(),
        local_path: css_rel.clone(),
        mime_type: "text/css".into(),
        size: 15,
    });
    manifest.record_asset(AssetRecord {
        url: img_url.to_string(),
        local_path: img_rel.clone(),
        mime_type: "image/png".into(),
        size: 4,
    });

    let html = r#"<html><head><link rel="stylesheet" href="/s.css"></head>
        <body><img src="/a/logo.png"></body></html>"#;
    let page_path = saver.reserve_html_path(&page_url);
    let rewritten = rewriter.rewrite_page(html, &page_url, &page_path).unwrap();
    saver.write_reserved_html(&page_path, &page_url, rewritten.clone()).await.unwrap();
    manifest.record_page(PageRecord {
        url: page_url.to_string(),
        local_path: page_path.clone(),
        status: 200,
        captured: chrono::Utc::now(),
        size: rewritten.len() as u64,
        title: None,
    });

    assert_eq!(page_path, "example.com/index.html");
    assert_eq!(css_rel, "example.com/s.css");
    assert_eq!(img_rel, "example.com/a/logo.png");

    assert!(rewritten.contains(r#"href="./s.css""#));
    assert!(rewritten.contains(r#"src="./a/logo.png""#));

    // Referential closure (§8 invariant 4): every rewritten relative path
    // resolves, from the HTML file's directory, to a file that exists.
    assert_referentially_closed(dir.path(), &page_path, &rewritten);

    assert_eq!(manifest.pages.len(), 1);
    assert_eq!(manifest.assets.len(), 2);
}

/// Scenario B: two URLs differing only in query-parameter order must map
/// to the exact same candidate path, because the page hash is computed
/// over a sorted query. This is what lets the crawler's visited-set
/// collapse them into a single capture before either ever reaches the
/// saver's collision-disambiguation logic.
#[test]
fn scenario_b_query_order_collapses_to_one_artifact() {
    let a = Url::parse("https://example.com/page?b=2&a=1").unwrap();
    let b = Url::parse("https://example.com/page?a=1&b=2").unwrap();

    let rel_a = url_to_path(&a, Layout::Original);
    let rel_b = url_to_path(&b, Layout::Original);
    assert_eq!(rel_a, rel_b, "reordered queries must hash to the same saved path");
}

/// §8 invariant 9: N distinct URLs whose sanitized candidate path collides
/// must still end up as N distinct files on disk.
#[tokio::test]
async fn collision_safety_produces_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let saver = ResourceSaver::new(dir.path().to_path_buf(), Layout::Flat, false, 1_048_576);

    // Flat layout collapses both of these under the same candidate name.
    let a = Url::parse("https://example.com/a/index.html").unwrap();
    let b = Url::parse("https://example.com/a-index.html").unwrap();

    let rel_a = saver.save_html(&a, "<html>a</html>".to_string()).await.unwrap();
    let rel_b = saver.save_html(&b, "<html>b</html>".to_string()).await.unwrap();

    assert_ne!(rel_a, rel_b);
    assert!(dir.path().join(&rel_a).exists());
    assert!(dir.path().join(&rel_b).exists());
}

/// §8 invariant 3: a resource shared by multiple pages (a common stylesheet,
/// say) is saved at most once — the second encounter must reuse the first
/// save's path rather than writing a second, `-1`-suffixed copy.
#[tokio::test]
async fn shared_asset_across_two_pages_saved_once() {
    let dir = tempfile::tempdir().unwrap();
    let saver = ResourceSaver::new(dir.path().to_path_buf(), Layout::Original, false, 1_048_576);

    let css_url = Url::parse("https://example.com/shared.css").unwrap();

    let first = saver.save(&css_url, b"body{color:red}".to_vec(), "text/css").await.unwrap();
    let second = saver.save(&css_url, b"body{color:red}".to_vec(), "text/css").await.unwrap();

    assert_eq!(first, second, "the same URL must resolve to the same saved path on a second encounter");
    assert!(!second.ends_with("-1.css"));

    let saved_files: Vec<_> = walk_files(dir.path());
    assert_eq!(saved_files.len(), 1, "only one file should exist on disk for a URL saved twice: {saved_files:?}");
}

fn walk_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        let path = entry.path();
        if path.is_dir() {
            out.extend(walk_files(&path));
        } else {
            out.push(path);
        }
    }
    out
}

fn assert_referentially_closed(output_dir: &Path, page_path: &str, html: &str) {
    let page_dir = Path::new(page_path).parent().unwrap_or_else(|| Path::new(""));
    let document = scraper::Html::parse_document(html);
    let link_selector = scraper::Selector::parse("link[href]").unwrap();
    let img_selector = scraper::Selector::parse("img[src]").unwrap();

    for el in document.select(&link_selector) {
        let href = el.value().attr("href").unwrap();
        assert!(output_dir.join(page_dir).join(href).exists(), "missing target for href={href}");
    }
    for el in document.select(&img_selector) {
        let src = el.value().attr("src").unwrap();
        assert!(output_dir.join(page_dir).join(src).exists(), "missing target for src={src}");
    }
}
