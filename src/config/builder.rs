//! Type-safe builder for `CrawlConfig` using the typestate pattern.
//!
//! A forgotten required field is a compile error: `build()` only exists
//! once both `output_dir` and `start_url` have been set, tracked through
//! phantom marker states.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::canonical::{Layout, Scope};
use crate::filter::FilterSpec;

use super::types::{CrawlConfig, Viewport, WaitStrategy};

// Type states for the builder.
pub struct WithOutputDir;
pub struct WithStartUrl;

pub struct CrawlConfigBuilder<State = ()> {
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) start_url: Option<String>,

    pub(crate) depth: u8,
    pub(crate) scope: Scope,
    pub(crate) stay_in_dir: bool,
    pub(crate) external_assets: bool,
    pub(crate) filter_spec: FilterSpec,
    pub(crate) layout: Layout,

    pub(crate) wait: WaitStrategy,
    pub(crate) wait_time_ms: u64,
    pub(crate) timeout_secs: u64,
    pub(crate) user_agent: Option<String>,
    pub(crate) viewport: Viewport,
    pub(crate) device: Option<String>,
    pub(crate) proxy: Option<String>,
    pub(crate) cookies_file: Option<PathBuf>,
    pub(crate) headers: HashMap<String, String>,

    pub(crate) har: bool,
    pub(crate) screenshot: bool,
    pub(crate) pdf: bool,
    pub(crate) strip_scripts: bool,
    pub(crate) inline_css: bool,

    pub(crate) concurrency: usize,
    pub(crate) max_pages: Option<u64>,
    pub(crate) max_time_secs: Option<u64>,
    pub(crate) rate_limit_ms: u64,
    pub(crate) ignore_robots: bool,
    pub(crate) use_cache: bool,
    pub(crate) update_mode: bool,

    pub(crate) headless: bool,
    pub(crate) stealth_mode: bool,
    pub(crate) chrome_data_dir: Option<PathBuf>,

    pub(crate) compress_output: bool,
    pub(crate) compression_threshold_bytes: usize,

    pub(crate) circuit_breaker_enabled: bool,
    pub(crate) circuit_breaker_failure_threshold: u32,
    pub(crate) circuit_breaker_retry_delay_secs: u64,
    pub(crate) max_concurrent_per_domain: usize,
    pub(crate) max_page_retries: u8,

    pub(crate) _phantom: PhantomData<State>,
}

impl Default for CrawlConfigBuilder<()> {
    fn default() -> Self {
        Self {
            output_dir: None,
            start_url: None,
            depth: 3,
            scope: Scope::Domain,
            stay_in_dir: false,
            external_assets: false,
            filter_spec: FilterSpec::default(),
            layout: Layout::Original,
            wait: WaitStrategy::NetworkIdle,
            wait_time_ms: 500,
            timeout_secs: 30,
            user_agent: None,
            viewport: Viewport::default(),
            device: None,
            proxy: None,
            cookies_file: None,
            headers: HashMap::new(),
            har: false,
            screenshot: false,
            pdf: false,
            strip_scripts: false,
            inline_css: false,
            concurrency: 8,
            max_pages: None,
            max_time_secs: None,
            rate_limit_ms: 0,
            ignore_robots: false,
            use_cache: true,
            update_mode: false,
            headless: true,
            stealth_mode: false,
            chrome_data_dir: None,
            compress_output: false,
            compression_threshold_bytes: 1_048_576,
            circuit_breaker_enabled: true,
            circuit_breaker_failure_threshold: 5,
            circuit_breaker_retry_delay_secs: 300,
            max_concurrent_per_domain: 2,
            max_page_retries: 3,
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfig {
    /// Starts a builder for configuring a `CrawlConfig` with a fluent interface.
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder<()> {
        CrawlConfigBuilder::default()
    }
}

macro_rules! carry_fields {
    ($self:expr) => {
        CrawlConfigBuilder {
            output_dir: $self.output_dir,
            start_url: $self.start_url,
            depth: $self.depth,
            scope: $self.scope,
            stay_in_dir: $self.stay_in_dir,
            external_assets: $self.external_assets,
            filter_spec: $self.filter_spec,
            layout: $self.layout,
            wait: $self.wait,
            wait_time_ms: $self.wait_time_ms,
            timeout_secs: $self.timeout_secs,
            user_agent: $self.user_agent,
            viewport: $self.viewport,
            device: $self.device,
            proxy: $self.proxy,
            cookies_file: $self.cookies_file,
            headers: $self.headers,
            har: $self.har,
            screenshot: $self.screenshot,
            pdf: $self.pdf,
            strip_scripts: $self.strip_scripts,
            inline_css: $self.inline_css,
            concurrency: $self.concurrency,
            max_pages: $self.max_pages,
            max_time_secs: $self.max_time_secs,
            rate_limit_ms: $self.rate_limit_ms,
            ignore_robots: $self.ignore_robots,
            use_cache: $self.use_cache,
            update_mode: $self.update_mode,
            headless: $self.headless,
            stealth_mode: $self.stealth_mode,
            chrome_data_dir: $self.chrome_data_dir,
            compress_output: $self.compress_output,
            compression_threshold_bytes: $self.compression_threshold_bytes,
            circuit_breaker_enabled: $self.circuit_breaker_enabled,
            circuit_breaker_failure_threshold: $self.circuit_breaker_failure_threshold,
            circuit_breaker_retry_delay_secs: $self.circuit_breaker_retry_delay_secs,
            max_concurrent_per_domain: $self.max_concurrent_per_domain,
            max_page_retries: $self.max_page_retries,
            _phantom: PhantomData,
        }
    };
}

impl CrawlConfigBuilder<()> {
    pub fn output_dir(self, dir: impl Into<PathBuf>) -> CrawlConfigBuilder<WithOutputDir> {
        let mut built: CrawlConfigBuilder<WithOutputDir> = carry_fields!(self);
        built.output_dir = Some(dir.into());
        built
    }
}

impl CrawlConfigBuilder<WithOutputDir> {
    pub fn start_url(self, url: impl Into<String>) -> CrawlConfigBuilder<WithStartUrl> {
        let url_string = url.into();
        let normalized = if url_string.starts_with("http://") || url_string.starts_with("https://") {
            url_string
        } else {
            format!("https://{url_string}")
        };
        let mut built: CrawlConfigBuilder<WithStartUrl> = carry_fields!(self);
        built.start_url = Some(normalized);
        built
    }
}

// Build method only available once both required fields are set.
impl CrawlConfigBuilder<WithStartUrl> {
    pub fn build(self) -> Result<CrawlConfig> {
        #[cfg(not(debug_assertions))]
        let headless = if !self.headless {
            tracing::warn!(
                "Forcing headless mode in release build. \
                Headed mode is only available in debug builds for development."
            );
            true
        } else {
            self.headless
        };
        #[cfg(debug_assertions)]
        let headless = self.headless;

        Ok(CrawlConfig {
            output_dir: self.output_dir.ok_or_else(|| anyhow!("output_dir is required"))?,
            start_url: self.start_url.ok_or_else(|| anyhow!("start_url is required"))?,
            depth: self.depth,
            scope: self.scope,
            stay_in_dir: self.stay_in_dir,
            external_assets: self.external_assets,
            filter_spec: self.filter_spec,
            layout: self.layout,
            wait: self.wait,
            wait_time_ms: self.wait_time_ms,
            timeout_secs: self.timeout_secs,
            user_agent: self.user_agent,
            viewport: self.viewport,
            device: self.device,
            proxy: self.proxy,
            cookies_file: self.cookies_file,
            headers: self.headers,
            har: self.har,
            screenshot: self.screenshot,
            pdf: self.pdf,
            strip_scripts: self.strip_scripts,
            inline_css: self.inline_css,
            concurrency: self.concurrency,
            max_pages: self.max_pages,
            max_time_secs: self.max_time_secs,
            rate_limit_ms: self.rate_limit_ms,
            ignore_robots: self.ignore_robots,
            use_cache: self.use_cache,
            update_mode: self.update_mode,
            headless,
            stealth_mode: self.stealth_mode,
            chrome_data_dir: self.chrome_data_dir,
            compress_output: self.compress_output,
            compression_threshold_bytes: self.compression_threshold_bytes,
            circuit_breaker_enabled: self.circuit_breaker_enabled,
            circuit_breaker_failure_threshold: self.circuit_breaker_failure_threshold,
            circuit_breaker_retry_delay_secs: self.circuit_breaker_retry_delay_secs,
            max_concurrent_per_domain: self.max_concurrent_per_domain,
            max_page_retries: self.max_page_retries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_output_dir_and_start_url() {
        let config = CrawlConfig::builder()
            .output_dir("./out")
            .start_url("example.com")
            .build()
            .unwrap();
        assert_eq!(config.start_url, "https://example.com");
        assert_eq!(config.depth, 3);
        assert_eq!(config.scope, Scope::Domain);
    }

    #[test]
    fn update_mode_defaults_off() {
        let config = CrawlConfig::builder().output_dir("./out").start_url("example.com").build().unwrap();
        assert!(!config.update_mode);
    }

    #[test]
    fn start_url_preserves_explicit_scheme() {
        let config = CrawlConfig::builder()
            .output_dir("./out")
            .start_url("http://example.com")
            .build()
            .unwrap();
        assert_eq!(config.start_url, "http://example.com");
    }
}
