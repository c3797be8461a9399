//! The Crawler orchestrator (SPEC_FULL §4.8): a bounded worker pool that
//! dequeues `(url, remainingDepth)` items, gates them through filter and
//! robots, drives one page capture per item, saves and rewrites its
//! resources, and enqueues its child links.
//!
//! Concurrency is a single `concurrency`-sized worker pool; the per-domain
//! limiter and circuit breaker are optional ambient robustness layers
//! rather than gates this orchestrator's correctness depends on.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chromiumoxide::Browser;
use dashmap::DashSet;
use tokio::sync::{Mutex, Notify};
use url::Url;

use crate::canonical::normalize;
use crate::config::CrawlConfig;
use crate::filter::Filter;
use crate::link_rewriter::LinkRewriter;
use crate::manifest::{AssetRecord, Cache, Manifest, OptionsSnapshot, PageRecord};
use crate::page_capture;
use crate::resource_saver::ResourceSaver;
use crate::robots::RobotsCache;

use super::circuit_breaker::{extract_domain, CircuitBreaker};
use super::cleanup::cleanup_browser_and_data;
use super::crawl_types::{CrawlError, CrawlQueue, CrawlResult};
use super::domain_limiter::DomainLimiter;
use super::observer::Observer;
use super::page_enhancer::enhance_page;
use super::retry_queue::RetryQueue;

struct SharedQueue {
    items: VecDeque<CrawlQueue>,
    busy: usize,
}

/// Pops the next queued item, draining circuit-breaker-recovered URLs back
/// in first. When every worker is idle and the queue is empty but the retry
/// queue is still holding items waiting on a circuit's half-open timeout,
/// polls rather than waiting on `notify` (no worker is left to signal it).
async fn next_item(queue: &Mutex<SharedQueue>, notify: &Notify, retry_queue: &RetryQueue) -> Option<CrawlQueue> {
    loop {
        let waiting_on_retry = {
            let mut state = queue.lock().await;
            if let Some(item) = state.items.pop_front() {
                state.busy += 1;
                return Some(item);
            }
            if state.busy == 0 {
                let ready = retry_queue.drain_ready();
                if !ready.is_empty() {
                    state.items.extend(ready);
                    continue;
                }
                if retry_queue.is_empty() {
                    return None;
                }
                true
            } else {
                false
            }
        };

        if waiting_on_retry {
            tokio::time::sleep(Duration::from_millis(250)).await;
        } else {
            notify.notified().await;
        }
    }
}

async fn finish_item(queue: &Mutex<SharedQueue>, notify: &Notify, children: Vec<CrawlQueue>) {
    let mut state = queue.lock().await;
    state.busy -= 1;
    state.items.extend(children);
    drop(state);
    notify.notify_waiters();
}

/// Everything a worker needs to process one queue item, shared read-only
/// (or behind its own internal synchronization) across the whole pool.
struct Shared {
    config: CrawlConfig,
    root: Url,
    filter: Filter,
    robots: RobotsCache,
    saver: ResourceSaver,
    rewriter: LinkRewriter,
    circuit_breaker: Arc<CircuitBreaker>,
    retry_queue: RetryQueue,
    domain_limiter: DomainLimiter,
    visited: DashSet<String>,
    manifest: Mutex<Manifest>,
    cache: Mutex<Cache>,
    observer: Arc<dyn Observer>,
    browser: Mutex<Browser>,
    started_at: Instant,
}

impl Shared {
    fn stop_tripped(&self, pages_visited: usize) -> bool {
        if let Some(max_pages) = self.config.max_pages {
            if pages_visited as u64 >= max_pages {
                return true;
            }
        }
        if let Some(max_time) = self.config.max_time_secs {
            if self.started_at.elapsed() >= Duration::from_secs(max_time) {
                return true;
            }
        }
        false
    }
}

/// Runs a full crawl to completion and returns the final manifest.
///
/// Resume semantics: if a manifest already exists under `config.output_dir`,
/// its recorded pages are inserted into the visited set before the first
/// item is dequeued, so a rerun does not recapture them.
pub async fn run(config: CrawlConfig, observer: Arc<dyn Observer>) -> CrawlResult<Manifest> {
    let root = Url::parse(&config.start_url)
        .map_err(|e| CrawlError::ConfigError(format!("invalid start_url: {e}")))?;

    let filter = config
        .compile_filter()
        .map_err(|e| CrawlError::ConfigError(e.to_string()))?;

    let mut client_builder = reqwest::Client::builder();
    if let Some(ua) = &config.user_agent {
        client_builder = client_builder.user_agent(ua.clone());
    }
    let client = client_builder
        .build()
        .map_err(|e| CrawlError::NetworkError(e.to_string()))?;
    let robots = RobotsCache::new(
        config.user_agent.clone().unwrap_or_else(|| "smippo".to_string()),
        !config.ignore_robots,
        client,
    );

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| CrawlError::ConfigError(format!("cannot create output dir: {e}")))?;

    let existing_manifest = Manifest::load(&config.output_dir).await.ok().flatten();
    let cache = if config.use_cache {
        Cache::load(&config.output_dir).await.unwrap_or_default()
    } else {
        Cache::default()
    };

    let manifest = existing_manifest.unwrap_or_else(|| {
        Manifest::new(
            config.start_url.clone(),
            OptionsSnapshot {
                depth: config.depth,
                scope: format!("{:?}", config.scope).to_lowercase(),
                stay_in_dir: config.stay_in_dir,
                external_assets: config.external_assets,
                include: config.filter_spec.include.clone(),
                exclude: config.filter_spec.exclude.clone(),
            },
        )
    });

    // In update mode, previously-captured pages are re-queued instead of
    // seeded as already-visited, so a rerun revalidates them; plain resume
    // seeds them here so a rerun never recaptures what is already saved.
    let visited = DashSet::new();
    if !config.update_mode {
        for page in &manifest.pages {
            visited.insert(normalize(&page.url));
        }
    }

    let saver = ResourceSaver::new(
        config.output_dir.clone(),
        config.layout,
        config.compress_output,
        config.compression_threshold_bytes,
    );
    for asset in &manifest.assets {
        saver.seed(normalize(&asset.url), asset.local_path.clone());
    }
    for page in &manifest.pages {
        saver.seed(normalize(&page.url), page.local_path.clone());
    }
    let rewriter = LinkRewriter::new(saver.url_map_handle(), config.strip_scripts);

    let (browser, browser_handle, chrome_data_dir) = crate::browser_setup::launch_browser(
        config.headless,
        config.chrome_data_dir.clone(),
        config.proxy.clone(),
    )
    .await
    .map_err(|e| CrawlError::BrowserError(e.to_string()))?;

    let circuit_breaker = Arc::new(CircuitBreaker::new(
        config.circuit_breaker_failure_threshold,
        2,
        Duration::from_secs(config.circuit_breaker_retry_delay_secs),
    ));
    let retry_queue = RetryQueue::new(circuit_breaker.clone());

    let domain_limiter = DomainLimiter::new(config.max_concurrent_per_domain);
    let output_dir = config.output_dir.clone();

    let shared = Arc::new(Shared {
        filter,
        robots,
        saver,
        rewriter,
        circuit_breaker,
        retry_queue,
        domain_limiter,
        visited,
        manifest: Mutex::new(manifest),
        cache: Mutex::new(cache),
        observer,
        browser: Mutex::new(browser),
        started_at: Instant::now(),
        root: root.clone(),
        config,
    });

    let queue = Arc::new(Mutex::new(SharedQueue {
        items: VecDeque::from([CrawlQueue { url: root.to_string(), depth: shared.config.depth, retry_count: 0 }]),
        busy: 0,
    }));
    let notify = Arc::new(Notify::new());

    let concurrency = shared.config.concurrency.max(1);
    let mut workers = Vec::with_capacity(concurrency);
    for _ in 0..concurrency {
        let shared = shared.clone();
        let queue = queue.clone();
        let notify = notify.clone();
        workers.push(tokio::spawn(async move {
            loop {
                let Some(item) = next_item(&queue, &notify, &shared.retry_queue).await else { break };
                let children = process_item(&shared, item).await;
                finish_item(&queue, &notify, children).await;
            }
        }));
    }
    for worker in workers {
        let _ = worker.await;
    }

    // Every worker's `JoinHandle` was awaited above, so `shared` is the last
    // strong reference left; this can only fail if a worker panicked while
    // still holding a clone, which `worker.await` above would have surfaced.
    let shared = Arc::try_unwrap(shared)
        .unwrap_or_else(|_| panic!("worker pool exited but a Shared reference is still outstanding"));

    let final_manifest = shared.manifest.into_inner();
    let final_cache = shared.cache.into_inner();
    let browser = shared.browser.into_inner();

    final_manifest.save(&output_dir).await.ok();
    final_cache.save(&output_dir).await.ok();
    if let Err(e) = cleanup_browser_and_data(browser, chrome_data_dir).await {
        log::warn!("browser cleanup failed: {e}");
    }
    let _ = browser_handle;

    Ok(final_manifest)
}

async fn process_item(shared: &Arc<Shared>, item: CrawlQueue) -> Vec<CrawlQueue> {
    let mut children = Vec::new();

    let Ok(url) = Url::parse(&item.url) else {
        return children;
    };
    let canonical = normalize(url.as_str());
    if !shared.visited.insert(canonical.clone()) {
        return children;
    }

    let pages_visited = shared.visited.len();
    if shared.stop_tripped(pages_visited) {
        return children;
    }

    if !shared.filter.should_follow(&url, &shared.root) {
        return children;
    }
    if !shared.robots.is_allowed(&url).await {
        return children;
    }

    if shared.config.rate_limit_ms > 0 {
        tokio::time::sleep(Duration::from_millis(shared.config.rate_limit_ms)).await;
    }
    if let Some(delay) = shared.robots.crawl_delay(&url).await {
        if delay > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(delay)).await;
        }
    }

    let domain = extract_domain(url.as_str()).unwrap_or_default();
    if shared.config.circuit_breaker_enabled && !shared.circuit_breaker.should_attempt(&domain) {
        shared.retry_queue.add(item);
        return children;
    }
    let _permit = shared.domain_limiter.acquire(domain.clone()).await;

    shared.observer.on_page_start(url.as_str());

    let capture_result = capture_page(shared, &url).await;

    let result = match capture_result {
        Ok(result) => {
            if shared.config.circuit_breaker_enabled {
                shared.circuit_breaker.record_success(&domain);
            }
            result
        }
        Err(e) => {
            if shared.config.circuit_breaker_enabled {
                shared.circuit_breaker.record_failure(&domain, &e.to_string());
            }
            shared.observer.on_error(url.as_str(), &e.to_string());
            let mut manifest = shared.manifest.lock().await;
            manifest.record_error();
            return children;
        }
    };

    let final_url = Url::parse(&result.final_url).unwrap_or(url.clone());

    // Step 7: save resources that pass the filter.
    let mut saved_css: Vec<(Url, String)> = Vec::new();
    for (resource_url, resource) in &result.resources {
        let Ok(parsed) = Url::parse(resource_url) else { continue };
        if !shared
            .filter
            .should_save(&parsed, &shared.root, &resource.mime_type, resource.size_bytes)
        {
            continue;
        }
        let Ok(relative) = shared.saver.save(&parsed, resource.bytes.clone(), &resource.mime_type).await else {
            continue;
        };
        if resource.mime_type.starts_with("text/css") {
            saved_css.push((parsed.clone(), relative.clone()));
        }
        {
            let mut cache = shared.cache.lock().await;
            cache.record(
                resource_url,
                resource.headers.get("etag").cloned(),
                resource.headers.get("last-modified").cloned(),
                Some(resource.mime_type.clone()),
            );
        }
        {
            let mut manifest = shared.manifest.lock().await;
            manifest.record_asset(AssetRecord {
                url: resource_url.clone(),
                local_path: relative.clone(),
                mime_type: resource.mime_type.clone(),
                size: resource.size_bytes,
            });
        }
        shared.observer.on_asset_save(resource_url, resource.size_bytes);
    }

    // Step 8: rewrite CSS files just saved.
    for (css_url, relative) in &saved_css {
        let _ = shared.rewriter.rewrite_saved_css(&shared.config.output_dir, css_url, relative).await;
    }

    // Step 9: rewrite and save HTML.
    let page_path = shared.saver.reserve_html_path(&final_url);
    let html = shared
        .rewriter
        .rewrite_page(&result.html, &final_url, &page_path)
        .unwrap_or_else(|_| result.html.clone());
    let html_len = html.len() as u64;
    if shared
        .saver
        .write_reserved_html(&page_path, &final_url, html)
        .await
        .is_err()
    {
        let mut manifest = shared.manifest.lock().await;
        manifest.record_error();
        return children;
    }

    // Step 10: optional screenshot/pdf, saved alongside the page's path.
    if let Some(bytes) = result.screenshot {
        let _ = shared.saver.save_screenshot(&page_path, bytes).await;
    }
    if let Some(bytes) = result.pdf {
        let _ = shared.saver.save_pdf(&page_path, bytes).await;
    }

    {
        let mut manifest = shared.manifest.lock().await;
        manifest.record_page(PageRecord {
            url: result.final_url.clone(),
            local_path: page_path,
            status: 200,
            captured: chrono::Utc::now(),
            size: html_len,
            title: result.title.clone(),
        });
    }
    shared.observer.on_page_complete(url.as_str(), html_len, result.links.pages.len());

    // Step 11: enqueue child page links at depth - 1.
    if item.depth > 0 {
        for link in &result.links.pages {
            if shared.visited.contains(&normalize(link)) {
                continue;
            }
            children.push(CrawlQueue { url: link.clone(), depth: item.depth - 1, retry_count: 0 });
        }
    }

    children
}

async fn capture_page(shared: &Arc<Shared>, url: &Url) -> anyhow::Result<page_capture::PageCaptureResult> {
    let page = {
        let browser = shared.browser.lock().await;
        browser.new_page("about:blank").await?
    };
    if shared.config.stealth_mode {
        enhance_page(page.clone()).await.ok();
    }
    page_capture::capture(page, url.as_str(), &shared.config).await
}
