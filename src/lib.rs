//! Smippo mirrors JavaScript-rendered web sites to disk with byte-level
//! fidelity, using a headless browser to drive page capture and a
//! bounded-concurrency crawl pipeline to save and rewrite every artifact it
//! observes.
//!
//! This crate is the *engine* described in SPEC_FULL.md: the CLI, the
//! interactive wizard, the static file server, and the standalone
//! screenshot command are external collaborators and are not part of this
//! library (SPEC_FULL §1, §6).

pub mod browser_setup;
pub mod canonical;
pub mod config;
pub mod crawl_engine;
pub mod filter;
pub mod kromekover;
pub mod link_rewriter;
pub mod manifest;
pub mod page_capture;
pub mod resource_saver;
pub mod robots;
pub mod utils;

pub use config::{CrawlConfig, CrawlConfigBuilder, Viewport, WaitStrategy};
pub use crawl_engine::{CrawlError, CrawlResult, NoOpObserver, Observer};
pub use manifest::{Cache, Manifest};

use std::sync::Arc;

/// Runs a crawl to completion per `config`, reporting progress to `observer`.
///
/// This is the engine's single entry point: it launches a browser, drives
/// the worker pool described in SPEC_FULL §4.8 to completion, and returns
/// the final manifest. The manifest and cache are already flushed to
/// `config.output_dir`'s `.smippo/` directory by the time this returns.
pub async fn crawl(config: CrawlConfig, observer: Arc<dyn Observer>) -> CrawlResult<Manifest> {
    crawl_engine::crawl_pages(config, observer).await
}

/// Convenience entry point for callers that don't need progress events.
pub async fn crawl_silent(config: CrawlConfig) -> CrawlResult<Manifest> {
    crawl(config, Arc::new(NoOpObserver)).await
}
