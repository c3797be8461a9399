//! Minimal binary entry point for the mirror engine.
//!
//! The full CLI parser, interactive wizard, and progress renderer are
//! external collaborators out of this engine's scope (SPEC_FULL §1, §6);
//! this binary wires the engine to a handful of flags and a bare-bones
//! stderr progress line so the crate is runnable standalone.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use smippo::canonical::Scope;
use smippo::{CrawlConfig, Observer};

struct StderrObserver;

impl Observer for StderrObserver {
    fn on_page_start(&self, url: &str) {
        tracing::info!(url, "capturing page");
    }

    fn on_page_complete(&self, url: &str, size: u64, links_found: usize) {
        tracing::info!(url, size, links_found, "page saved");
    }

    fn on_asset_save(&self, url: &str, size: u64) {
        tracing::debug!(url, size, "asset saved");
    }

    fn on_error(&self, url: &str, error: &str) {
        tracing::warn!(url, error, "capture failed");
    }
}

fn usage() -> &'static str {
    "usage: smippo <url> --output <dir> [--depth N] [--concurrency N] \
     [--scope subdomain|domain|tld|all] [--stay-in-dir] [--ignore-robots] \
     [--max-pages N] [--screenshot] [--pdf] [--strip-scripts] [--update]"
}

fn parse_args() -> Result<CrawlConfig> {
    let mut args = std::env::args().skip(1).peekable();
    let Some(url) = args.next() else { bail!(usage()) };
    if url == "--help" || url == "-h" {
        bail!(usage());
    }

    let mut output = PathBuf::from("./mirror");
    let mut builder = CrawlConfig::builder();
    let mut depth: Option<u8> = None;
    let mut scope: Option<Scope> = None;
    let mut stay_in_dir = false;
    let mut ignore_robots = false;
    let mut screenshot = false;
    let mut pdf = false;
    let mut strip_scripts = false;
    let mut update_mode = false;
    let mut concurrency: Option<usize> = None;
    let mut max_pages: Option<u64> = None;

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--output" | "-o" => output = PathBuf::from(args.next().ok_or_else(|| anyhow::anyhow!(usage()))?),
            "--depth" => depth = Some(args.next().ok_or_else(|| anyhow::anyhow!(usage()))?.parse()?),
            "--concurrency" => concurrency = Some(args.next().ok_or_else(|| anyhow::anyhow!(usage()))?.parse()?),
            "--max-pages" => max_pages = Some(args.next().ok_or_else(|| anyhow::anyhow!(usage()))?.parse()?),
            "--scope" => {
                scope = Some(match args.next().ok_or_else(|| anyhow::anyhow!(usage()))?.as_str() {
                    "subdomain" => Scope::Subdomain,
                    "domain" => Scope::Domain,
                    "tld" => Scope::Tld,
                    "all" => Scope::All,
                    other => bail!("unknown scope '{other}'"),
                });
            }
            "--stay-in-dir" => stay_in_dir = true,
            "--ignore-robots" => ignore_robots = true,
            "--screenshot" => screenshot = true,
            "--pdf" => pdf = true,
            "--strip-scripts" => strip_scripts = true,
            "--update" => update_mode = true,
            other => bail!("unrecognized flag '{other}'\n{}", usage()),
        }
    }

    builder = builder.depth(depth.unwrap_or(3));
    if let Some(scope) = scope {
        builder = builder.scope(scope);
    }
    builder = builder
        .stay_in_dir(stay_in_dir)
        .ignore_robots(ignore_robots)
        .screenshot(screenshot)
        .pdf(pdf)
        .strip_scripts(strip_scripts)
        .update_mode(update_mode);
    if let Some(concurrency) = concurrency {
        builder = builder.concurrency(concurrency);
    }
    if let Some(max_pages) = max_pages {
        builder = builder.max_pages(max_pages);
    }

    Ok(builder.output_dir(output).start_url(url).build()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = parse_args()?;
    let manifest = smippo::crawl(config, Arc::new(StderrObserver)).await?;
    println!(
        "captured {} pages, {} assets ({} errors) in {}ms",
        manifest.stats.pages_captured, manifest.stats.assets_captured, manifest.stats.errors, manifest.stats.duration_ms
    );
    Ok(())
}
