//! Robots Discipline integration tests (SPEC_FULL §4.3), scenario F of §8:
//! a `Disallow` rule must block matching URLs even when linked from a
//! captured page, and an absent/broken `robots.txt` must default to allow.

mod common;

use mockito::Server;
use smippo::robots::RobotsCache;
use url::Url;

#[tokio::test]
async fn disallowed_path_is_rejected() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/robots.txt")
        .with_status(200)
        .with_body("User-agent: *\nDisallow: /private/\n")
        .create_async()
        .await;

    let cache = RobotsCache::new("smippo", true, reqwest::Client::new());
    let allowed = Url::parse(&common::test_url(&server, "/page")).unwrap();
    let disallowed = Url::parse(&common::test_url(&server, "/private/secret")).unwrap();

    assert!(cache.is_allowed(&allowed).await);
    assert!(!cache.is_allowed(&disallowed).await);
}

#[tokio::test]
async fn crawl_delay_is_read_from_rules() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/robots.txt")
        .with_status(200)
        .with_body("User-agent: *\nCrawl-delay: 2\n")
        .create_async()
        .await;

    let cache = RobotsCache::new("smippo", true, reqwest::Client::new());
    let url = Url::parse(&common::test_url(&server, "/page")).unwrap();
    assert_eq!(cache.crawl_delay(&url).await, Some(2.0));
}

#[tokio::test]
async fn missing_robots_txt_defaults_to_allow() {
    let mut server = Server::new_async().await;
    let _m = server.mock("GET", "/robots.txt").with_status(404).create_async().await;

    let cache = RobotsCache::new("smippo", true, reqwest::Client::new());
    let url = Url::parse(&common::test_url(&server, "/anything")).unwrap();
    assert!(cache.is_allowed(&url).await);
}

#[tokio::test]
async fn result_is_memoized_across_calls_for_the_same_origin() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/robots.txt")
        .with_status(200)
        .with_body("User-agent: *\nDisallow: /x\n")
        .expect(1)
        .create_async()
        .await;

    let cache = RobotsCache::new("smippo", true, reqwest::Client::new());
    let a = Url::parse(&common::test_url(&server, "/a")).unwrap();
    let b = Url::parse(&common::test_url(&server, "/b")).unwrap();
    assert!(cache.is_allowed(&a).await);
    assert!(cache.is_allowed(&b).await);

    m.assert_async().await;
}

#[tokio::test]
async fn ignoring_robots_skips_the_fetch_entirely() {
    let mut server = Server::new_async().await;
    let m = server.mock("GET", "/robots.txt").expect(0).create_async().await;

    let cache = RobotsCache::new("smippo", false, reqwest::Client::new());
    let disallowed = Url::parse(&common::test_url(&server, "/private/secret")).unwrap();
    assert!(cache.is_allowed(&disallowed).await);

    m.assert_async().await;
}
