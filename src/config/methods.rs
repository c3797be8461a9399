//! Builder methods available regardless of typestate — every optional
//! field in `CrawlConfig` (SPEC_FULL §6) has a fluent setter here.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::canonical::{Layout, Scope};
use crate::filter::FilterSpec;

use super::builder::CrawlConfigBuilder;
use super::types::{Viewport, WaitStrategy};

impl<State> CrawlConfigBuilder<State> {
    #[must_use]
    pub fn depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn stay_in_dir(mut self, stay: bool) -> Self {
        self.stay_in_dir = stay;
        self
    }

    #[must_use]
    pub fn external_assets(mut self, external: bool) -> Self {
        self.external_assets = external;
        self
    }

    #[must_use]
    pub fn filter_spec(mut self, spec: FilterSpec) -> Self {
        self.filter_spec = spec;
        self
    }

    #[must_use]
    pub fn include(mut self, patterns: Vec<String>) -> Self {
        self.filter_spec.include = patterns;
        self
    }

    #[must_use]
    pub fn exclude(mut self, patterns: Vec<String>) -> Self {
        self.filter_spec.exclude = patterns;
        self
    }

    #[must_use]
    pub fn mime_include(mut self, patterns: Vec<String>) -> Self {
        self.filter_spec.mime_include = patterns;
        self
    }

    #[must_use]
    pub fn mime_exclude(mut self, patterns: Vec<String>) -> Self {
        self.filter_spec.mime_exclude = patterns;
        self
    }

    #[must_use]
    pub fn min_size(mut self, bytes: u64) -> Self {
        self.filter_spec.min_size = Some(bytes);
        self
    }

    #[must_use]
    pub fn max_size(mut self, bytes: u64) -> Self {
        self.filter_spec.max_size = Some(bytes);
        self
    }

    #[must_use]
    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn wait(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }

    #[must_use]
    pub fn wait_time_ms(mut self, ms: u64) -> Self {
        self.wait_time_ms = ms;
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    #[must_use]
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Viewport { width, height };
        self
    }

    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn cookies_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookies_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn har(mut self, enabled: bool) -> Self {
        self.har = enabled;
        self
    }

    #[must_use]
    pub fn screenshot(mut self, enabled: bool) -> Self {
        self.screenshot = enabled;
        self
    }

    #[must_use]
    pub fn pdf(mut self, enabled: bool) -> Self {
        self.pdf = enabled;
        self
    }

    #[must_use]
    pub fn strip_scripts(mut self, enabled: bool) -> Self {
        self.strip_scripts = enabled;
        self
    }

    #[must_use]
    pub fn inline_css(mut self, enabled: bool) -> Self {
        self.inline_css = enabled;
        self
    }

    #[must_use]
    pub fn concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers.max(1);
        self
    }

    #[must_use]
    pub fn max_pages(mut self, max: u64) -> Self {
        self.max_pages = Some(max);
        self
    }

    #[must_use]
    pub fn max_time_secs(mut self, secs: u64) -> Self {
        self.max_time_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn rate_limit_ms(mut self, ms: u64) -> Self {
        self.rate_limit_ms = ms;
        self
    }

    #[must_use]
    pub fn ignore_robots(mut self, ignore: bool) -> Self {
        self.ignore_robots = ignore;
        self
    }

    #[must_use]
    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// When set, a previously-captured page is re-navigated with conditional
    /// request headers (`If-None-Match`/`If-Modified-Since`) derived from
    /// `cache.json` instead of being skipped outright; a `304` response
    /// reuses the already-saved page and asset files.
    #[must_use]
    pub fn update_mode(mut self, update_mode: bool) -> Self {
        self.update_mode = update_mode;
        self
    }

    /// Set browser headless mode. Enforced back to `true` in release builds;
    /// see [`super::builder::CrawlConfigBuilder::build`].
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn stealth_mode(mut self, stealth: bool) -> Self {
        self.stealth_mode = stealth;
        self
    }

    pub fn chrome_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chrome_data_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn compress_output(mut self, compress: bool) -> Self {
        self.compress_output = compress;
        self
    }

    #[must_use]
    pub fn compression_threshold_bytes(mut self, bytes: usize) -> Self {
        self.compression_threshold_bytes = bytes;
        self
    }

    #[must_use]
    pub fn circuit_breaker_enabled(mut self, enabled: bool) -> Self {
        self.circuit_breaker_enabled = enabled;
        self
    }

    #[must_use]
    pub fn circuit_breaker_failure_threshold(mut self, threshold: u32) -> Self {
        self.circuit_breaker_failure_threshold = threshold;
        self
    }

    #[must_use]
    pub fn circuit_breaker_retry_delay_secs(mut self, delay_secs: u64) -> Self {
        self.circuit_breaker_retry_delay_secs = delay_secs;
        self
    }

    #[must_use]
    pub fn max_concurrent_per_domain(mut self, max: usize) -> Self {
        self.max_concurrent_per_domain = max.max(1);
        self
    }

    /// Maximum retry attempts for a transiently-failed page. Set to 0 to
    /// disable page-level retries.
    #[must_use]
    pub fn max_page_retries(mut self, retries: u8) -> Self {
        self.max_page_retries = retries;
        self
    }
}
