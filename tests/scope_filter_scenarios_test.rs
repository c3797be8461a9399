//! End-to-end-scenario-style tests for the Filter + Scope Oracle gate that
//! `Crawler::process_item` applies before ever opening a tab (SPEC_FULL §4.8
//! step 3-4), covering §8 scenarios C, D, E.

use smippo::canonical::Scope;
use smippo::CrawlConfig;
use url::Url;

fn root(url: &str) -> Url {
    Url::parse(url).unwrap()
}

/// Scenario C: depth-1 crawl, root links to an in-domain page and an
/// off-domain page under `scope=domain`; only the in-domain link follows.
#[test]
fn scenario_c_domain_scope_rejects_other_domains() {
    let dir = tempfile::tempdir().unwrap();
    let config = CrawlConfig::builder()
        .output_dir(dir.path().to_path_buf())
        .start_url("https://example.com/")
        .build()
        .unwrap();
    let filter = config.compile_filter().unwrap();
    let root_url = root("https://example.com/");

    let same_domain = root("https://example.com/x");
    let other_domain = root("https://evil.com/y");

    assert!(filter.should_follow(&same_domain, &root_url));
    assert!(!filter.should_follow(&other_domain, &root_url));
}

/// Scenario D: `scope=subdomain` + `externalAssets=true` saves a
/// cross-subdomain asset without permitting that subdomain to be crawled
/// for pages.
#[test]
fn scenario_d_external_assets_saved_but_not_crawled() {
    let dir = tempfile::tempdir().unwrap();
    let config = CrawlConfig::builder()
        .output_dir(dir.path().to_path_buf())
        .start_url("https://example.com/")
        .scope(Scope::Subdomain)
        .external_assets(true)
        .build()
        .unwrap();
    let filter = config.compile_filter().unwrap();
    let root_url = root("https://example.com/");

    let cdn_asset = root("https://cdn.example.com/style.css");
    assert!(filter.should_download_asset(&cdn_asset, &root_url));
    // The CDN host would never be followed for page discovery under
    // subdomain scope, asset policy notwithstanding.
    assert!(!filter.should_follow(&cdn_asset, &root_url));
}

/// Scenario E: an exclude pattern takes precedence over a catch-all include.
#[test]
fn scenario_e_exclude_blocks_despite_catch_all_include() {
    let dir = tempfile::tempdir().unwrap();
    let config = CrawlConfig::builder()
        .output_dir(dir.path().to_path_buf())
        .start_url("https://example.com/")
        .include(vec!["*".to_string()])
        .exclude(vec!["*tracker*".to_string()])
        .build()
        .unwrap();
    let filter = config.compile_filter().unwrap();
    let root_url = root("https://example.com/");

    let normal = root("https://example.com/x");
    let tracker = root("https://example.com/tracker/t");

    assert!(filter.should_follow(&normal, &root_url));
    assert!(!filter.should_follow(&tracker, &root_url));
}

/// Scenario G building block: `maxPages` is read straight off the config,
/// the orchestrator's stop check compares `visited.len()` against it.
#[test]
fn max_pages_option_is_threaded_onto_the_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = CrawlConfig::builder()
        .output_dir(dir.path().to_path_buf())
        .start_url("https://example.com/")
        .max_pages(5)
        .build()
        .unwrap();
    assert_eq!(config.max_pages, Some(5));
}
