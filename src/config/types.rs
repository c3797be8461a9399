//! The `CrawlConfig` record: every option the engine accepts (SPEC_FULL §6),
//! plus the ambient settings that wire it to the browser launcher, the
//! circuit breaker, and the resource saver.
//!
//! Built exclusively through [`super::builder::CrawlConfigBuilder`]; there is
//! no public constructor that skips validation.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::canonical::{Layout, Scope};
use crate::filter::FilterSpec;

/// Browser wait condition applied after navigation, before the settle delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum WaitStrategy {
    #[default]
    NetworkIdle,
    Load,
    DomContentLoaded,
}

/// Emulated viewport size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1920, height: 1080 }
    }
}

/// Immutable, validated configuration for one crawl run.
///
/// Every field here is either a recognized engine option (SPEC_FULL §6) or
/// an ambient setting (browser launch, circuit breaker, output compression)
/// that has no external-interface counterpart but is still required to run
/// a real crawl. Construct via [`CrawlConfig::builder`].
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub output_dir: PathBuf,
    pub start_url: String,

    pub depth: u8,
    pub scope: Scope,
    pub stay_in_dir: bool,
    pub external_assets: bool,
    pub filter_spec: FilterSpec,
    pub layout: Layout,

    pub wait: WaitStrategy,
    pub wait_time_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
    pub viewport: Viewport,
    pub device: Option<String>,
    pub proxy: Option<String>,
    pub cookies_file: Option<PathBuf>,
    pub headers: HashMap<String, String>,

    pub har: bool,
    pub screenshot: bool,
    pub pdf: bool,
    pub strip_scripts: bool,
    pub inline_css: bool,

    pub concurrency: usize,
    pub max_pages: Option<u64>,
    pub max_time_secs: Option<u64>,
    pub rate_limit_ms: u64,
    pub ignore_robots: bool,
    pub use_cache: bool,
    pub update_mode: bool,

    // Ambient: browser process and stealth.
    pub headless: bool,
    pub stealth_mode: bool,
    pub chrome_data_dir: Option<PathBuf>,

    // Ambient: output compression (content_saver::compression heritage).
    pub compress_output: bool,
    pub compression_threshold_bytes: usize,

    // Ambient: per-domain failure discipline.
    pub circuit_breaker_enabled: bool,
    pub circuit_breaker_failure_threshold: u32,
    pub circuit_breaker_retry_delay_secs: u64,
    pub max_concurrent_per_domain: usize,
    pub max_page_retries: u8,
}
