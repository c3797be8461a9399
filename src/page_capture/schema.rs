//! Data records produced by one page capture (SPEC_FULL §3): the
//! `Resource`/`PageCaptureResult` shape the link rewriter and resource
//! saver consume.

use std::collections::HashMap;
use std::time::Duration;

use crate::page_capture::links::ExtractedLinks;

/// One non-HTML HTTP response collected by the passive response sniffer.
#[derive(Debug, Clone)]
pub struct Resource {
    pub url: String,
    pub http_status: u16,
    pub mime_type: String,
    pub size_bytes: u64,
    pub bytes: Vec<u8>,
    pub headers: HashMap<String, String>,
}

/// Links discovered in a captured page, split by classification plus the
/// union of both (SPEC_FULL §3's `links {pages, assets, all}`).
#[derive(Debug, Default, Clone)]
pub struct Links {
    pub pages: Vec<String>,
    pub assets: Vec<String>,
    pub all: Vec<String>,
}

impl From<ExtractedLinks> for Links {
    fn from(extracted: ExtractedLinks) -> Self {
        let mut all = Vec::with_capacity(extracted.pages.len() + extracted.assets.len());
        all.extend(extracted.pages.iter().cloned());
        all.extend(extracted.assets.iter().cloned());
        Self { pages: extracted.pages, assets: extracted.assets, all }
    }
}

/// The single-use result of capturing one URL with a browser tab.
#[derive(Debug, Clone)]
pub struct PageCaptureResult {
    pub requested_url: String,
    pub final_url: String,
    pub html: String,
    pub title: Option<String>,
    pub links: Links,
    /// canonical URL -> captured response, last writer wins.
    pub resources: HashMap<String, Resource>,
    pub screenshot: Option<Vec<u8>>,
    pub pdf: Option<Vec<u8>>,
    pub duration: Duration,
}
