//! Resource Saver (SPEC_FULL §4.4): URL → local relative path, with
//! content-type-driven extension fixing and collision-safe writes. Every
//! saved resource is recorded into a shared `url -> relative path` map for
//! the link rewriter to consume.

mod compression;
mod extension;
mod headers;

pub use compression::{save_compressed_file, CacheMetadata};
pub use headers::{extract_content_type, extract_etag, extract_last_modified};

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use url::Url;

use crate::canonical::{normalize, url_to_path, Layout};

/// Owns the output directory and the authoritative URL → relative path map.
pub struct ResourceSaver {
    output_dir: PathBuf,
    layout: Layout,
    compress_output: bool,
    compression_threshold_bytes: usize,
    /// canonical URL -> relative path already saved. Shared (not just
    /// borrowed) so the link rewriter can hold the same map the saver
    /// writes into without copying it on every lookup.
    url_map: Arc<DashMap<String, String>>,
    /// relative path -> count of URLs that resolved to it (for `-N` suffixing).
    reserved: DashMap<String, u32>,
}

impl ResourceSaver {
    #[must_use]
    pub fn new(
        output_dir: PathBuf,
        layout: Layout,
        compress_output: bool,
        compression_threshold_bytes: usize,
    ) -> Self {
        Self {
            output_dir,
            layout,
            compress_output,
            compression_threshold_bytes,
            url_map: Arc::new(DashMap::new()),
            reserved: DashMap::new(),
        }
    }

    /// Seeds the map from a resumed manifest so previously-saved URLs are
    /// not re-saved and are still available to the link rewriter.
    pub fn seed(&self, canonical_url: String, relative_path: String) {
        self.reserve_exact(&relative_path);
        self.url_map.insert(canonical_url, relative_path);
    }

    #[must_use]
    pub fn url_map(&self) -> &DashMap<String, String> {
        &self.url_map
    }

    /// A cheap `Arc` clone of the authoritative URL map, for collaborators
    /// (the link rewriter) that need to hold it across the run rather than
    /// borrow it for one call.
    #[must_use]
    pub fn url_map_handle(&self) -> Arc<DashMap<String, String>> {
        self.url_map.clone()
    }

    #[must_use]
    pub fn local_path_for(&self, url: &str) -> Option<String> {
        self.url_map.get(&normalize(url)).map(|e| e.value().clone())
    }

    fn reserve_exact(&self, path: &str) {
        self.reserved.entry(path.to_string()).or_insert(0);
    }

    /// Resolves a candidate relative path to one guaranteed unique across
    /// all URLs saved by this saver, appending `-N` before the extension
    /// when a collision occurs.
    fn reserve(&self, candidate: String) -> String {
        let n = {
            let mut counter = self.reserved.entry(candidate.clone()).or_insert(0);
            let seen = *counter;
            *counter += 1;
            seen
        };
        if n == 0 {
            candidate
        } else {
            extension::splice_before_extension(&candidate, &format!("-{n}"))
        }
    }

    /// Saves a non-HTML resource and records its URL → path mapping. A URL
    /// already saved (the common case for CSS/JS/fonts/logos shared across
    /// pages) is recognized by its existing entry and returned unchanged,
    /// without touching disk or consuming a collision suffix.
    pub async fn save(&self, url: &Url, bytes: Vec<u8>, mime: &str) -> anyhow::Result<String> {
        if let Some(existing) = self.local_path_for(url.as_str()) {
            return Ok(existing);
        }
        let candidate = extension::fix_extension(&url_to_path(url, self.layout), mime);
        let relative = self.reserve(candidate);
        self.write(&relative, bytes).await?;
        self.url_map.insert(normalize(url.as_str()), relative.clone());
        Ok(relative)
    }

    /// Saves an HTML page. Always written as UTF-8 text (never treated as a
    /// generic binary resource). A URL already saved is returned unchanged.
    pub async fn save_html(&self, url: &Url, html: String) -> anyhow::Result<String> {
        if let Some(existing) = self.local_path_for(url.as_str()) {
            return Ok(existing);
        }
        let candidate = url_to_path(url, self.layout);
        let relative = self.reserve(candidate);
        self.write(&relative, html.into_bytes()).await?;
        self.url_map.insert(normalize(url.as_str()), relative.clone());
        Ok(relative)
    }

    /// Reserves (without writing) the relative path a page's HTML will be
    /// saved at. The link rewriter needs this path *before* the HTML is
    /// rewritten, since every rewritten link is relative to it; pair with
    /// [`ResourceSaver::write_reserved_html`] once rewriting is done.
    #[must_use]
    pub fn reserve_html_path(&self, url: &Url) -> String {
        self.reserve(url_to_path(url, self.layout))
    }

    /// Writes already-rewritten HTML at a path previously returned by
    /// [`ResourceSaver::reserve_html_path`] and records the URL → path entry.
    pub async fn write_reserved_html(&self, relative: &str, url: &Url, html: String) -> anyhow::Result<()> {
        self.write(relative, html.into_bytes()).await?;
        self.url_map.insert(normalize(url.as_str()), relative.to_string());
        Ok(())
    }

    /// Saves a screenshot as a sibling of the page's saved HTML path.
    pub async fn save_screenshot(&self, html_relative_path: &str, bytes: Vec<u8>) -> anyhow::Result<String> {
        let relative = sibling_with_extension(html_relative_path, "png");
        self.write(&relative, bytes).await?;
        Ok(relative)
    }

    /// Saves a PDF capture as a sibling of the page's saved HTML path.
    pub async fn save_pdf(&self, html_relative_path: &str, bytes: Vec<u8>) -> anyhow::Result<String> {
        let relative = sibling_with_extension(html_relative_path, "pdf");
        self.write(&relative, bytes).await?;
        Ok(relative)
    }

    async fn write(&self, relative: &str, bytes: Vec<u8>) -> anyhow::Result<()> {
        let full_path = self.output_dir.join(relative);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if self.compress_output {
            let content_type = "application/octet-stream";
            save_compressed_file(bytes, &full_path, content_type, true, self.compression_threshold_bytes).await?;
        } else {
            tokio::fs::write(&full_path, bytes).await?;
        }
        Ok(())
    }
}

fn sibling_with_extension(html_relative_path: &str, ext: &str) -> String {
    match html_relative_path.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.{ext}"),
        None => format!("{html_relative_path}.{ext}"),
    }
}
