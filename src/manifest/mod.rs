//! `.smippo/manifest.json` and `.smippo/cache.json` persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

pub const SMIPPO_DIR: &str = ".smippo";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const CACHE_FILE: &str = "cache.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub local_path: String,
    pub status: u16,
    pub captured: DateTime<Utc>,
    pub size: u64,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    pub url: String,
    pub local_path: String,
    pub mime_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub pages_captured: u64,
    pub assets_captured: u64,
    pub total_size: u64,
    pub duration_ms: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsSnapshot {
    pub depth: u8,
    pub scope: String,
    pub stay_in_dir: bool,
    pub external_assets: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub root_url: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub options: OptionsSnapshot,
    pub stats: Stats,
    pub pages: Vec<PageRecord>,
    pub assets: Vec<AssetRecord>,
}

impl Manifest {
    #[must_use]
    pub fn new(root_url: impl Into<String>, options: OptionsSnapshot) -> Self {
        let now = Utc::now();
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            root_url: root_url.into(),
            created: now,
            updated: now,
            options,
            stats: Stats::default(),
            pages: Vec::new(),
            assets: Vec::new(),
        }
    }

    /// `true` if `url` already has a page record (used to seed the visited
    /// set on resume).
    #[must_use]
    pub fn has_page(&self, url: &str) -> bool {
        self.pages.iter().any(|p| p.url == url)
    }

    /// Records a captured page, replacing any prior record for the same URL
    /// (an `update_mode` rerun recaptures pages already in the manifest).
    pub fn record_page(&mut self, record: PageRecord) {
        if let Some(existing) = self.pages.iter_mut().find(|p| p.url == record.url) {
            self.stats.total_size = self.stats.total_size.saturating_sub(existing.size) + record.size;
            *existing = record;
        } else {
            self.stats.pages_captured += 1;
            self.stats.total_size += record.size;
            self.pages.push(record);
        }
        self.updated = Utc::now();
    }

    /// Records a saved asset, replacing any prior record for the same URL.
    pub fn record_asset(&mut self, record: AssetRecord) {
        if let Some(existing) = self.assets.iter_mut().find(|a| a.url == record.url) {
            self.stats.total_size = self.stats.total_size.saturating_sub(existing.size) + record.size;
            *existing = record;
        } else {
            self.stats.assets_captured += 1;
            self.stats.total_size += record.size;
            self.assets.push(record);
        }
        self.updated = Utc::now();
    }

    pub fn record_error(&mut self) {
        self.stats.errors += 1;
        self.updated = Utc::now();
    }

    fn path(output_dir: &Path) -> PathBuf {
        output_dir.join(SMIPPO_DIR).join(MANIFEST_FILE)
    }

    /// Loads an existing manifest, if one is present, for resume.
    pub async fn load(output_dir: &Path) -> anyhow::Result<Option<Self>> {
        let path = Self::path(output_dir);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically writes the manifest: write to a temp file, then rename.
    pub async fn save(&self, output_dir: &Path) -> anyhow::Result<()> {
        let dir = output_dir.join(SMIPPO_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        let final_path = Self::path(output_dir);
        let tmp_path = dir.join(format!("{MANIFEST_FILE}.tmp"));
        let bytes = serde_json::to_vec_pretty(self)?;
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        tokio::fs::rename(&tmp_path, &final_path).await?;
        Ok(())
    }
}

/// Advisory per-URL cache metadata used by `update` mode to issue
/// conditional requests.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Cache {
    pub etags: HashMap<String, String>,
    pub last_modified: HashMap<String, String>,
    pub content_types: HashMap<String, String>,
}

impl Cache {
    fn path(output_dir: &Path) -> PathBuf {
        output_dir.join(SMIPPO_DIR).join(CACHE_FILE)
    }

    pub async fn load(output_dir: &Path) -> anyhow::Result<Self> {
        let path = Self::path(output_dir);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, output_dir: &Path) -> anyhow::Result<()> {
        let dir = output_dir.join(SMIPPO_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        let bytes = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(Self::path(output_dir), bytes).await?;
        Ok(())
    }

    pub fn record(&mut self, url: &str, etag: Option<String>, last_modified: Option<String>, content_type: Option<String>) {
        if let Some(etag) = etag {
            self.etags.insert(url.to_string(), etag);
        }
        if let Some(lm) = last_modified {
            self.last_modified.insert(url.to_string(), lm);
        }
        if let Some(ct) = content_type {
            self.content_types.insert(url.to_string(), ct);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let options = OptionsSnapshot {
            depth: 2,
            scope: "domain".into(),
            stay_in_dir: false,
            external_assets: false,
            include: vec![],
            exclude: vec![],
        };
        let mut manifest = Manifest::new("https://example.com/", options);
        manifest.record_page(PageRecord {
            url: "https://example.com/".into(),
            local_path: "example.com/index.html".into(),
            status: 200,
            captured: Utc::now(),
            size: 1024,
            title: Some("Home".into()),
        });
        manifest.save(dir.path()).await.unwrap();

        let loaded = Manifest::load(dir.path()).await.unwrap().unwrap();
        assert_eq!(loaded.stats.pages_captured, 1);
        assert!(loaded.has_page("https://example.com/"));
    }

    #[test]
    fn recapturing_a_page_replaces_its_record_instead_of_duplicating() {
        let options = OptionsSnapshot {
            depth: 2,
            scope: "domain".into(),
            stay_in_dir: false,
            external_assets: false,
            include: vec![],
            exclude: vec![],
        };
        let mut manifest = Manifest::new("https://example.com/", options);
        manifest.record_page(PageRecord {
            url: "https://example.com/".into(),
            local_path: "example.com/index.html".into(),
            status: 200,
            captured: Utc::now(),
            size: 1024,
            title: Some("Home".into()),
        });
        manifest.record_page(PageRecord {
            url: "https://example.com/".into(),
            local_path: "example.com/index.html".into(),
            status: 200,
            captured: Utc::now(),
            size: 2048,
            title: Some("Home v2".into()),
        });
        assert_eq!(manifest.pages.len(), 1);
        assert_eq!(manifest.stats.pages_captured, 1);
        assert_eq!(manifest.stats.total_size, 2048);
        assert_eq!(manifest.pages[0].title.as_deref(), Some("Home v2"));
    }

    #[tokio::test]
    async fn missing_manifest_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Manifest::load(dir.path()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = Cache::default();
        cache.record("https://e.com/a", Some("\"abc\"".into()), None, Some("text/html".into()));
        cache.save(dir.path()).await.unwrap();
        let loaded = Cache::load(dir.path()).await.unwrap();
        assert_eq!(loaded.etags.get("https://e.com/a").unwrap(), "\"abc\"");
    }
}
