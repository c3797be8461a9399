//! URL/MIME/size gating on top of the scope oracle.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::canonical::{in_scope, Scope};

/// Declarative filter configuration (SPEC_FULL §4.2). Compiled once; the
/// compiled regex sets are not serialized, only the source patterns are.
#[derive(Clone)]
pub struct Filter {
    scope: Scope,
    stay_in_dir: bool,
    external_assets: bool,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    mime_include: Vec<MimePattern>,
    mime_exclude: Vec<MimePattern>,
    min_size: Option<u64>,
    max_size: Option<u64>,
}

/// Source form of [`Filter`], suitable for embedding in [`crate::config::CrawlConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub mime_include: Vec<String>,
    pub mime_exclude: Vec<String>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
}

#[derive(Clone)]
enum MimePattern {
    Exact(String),
    Prefix(String),
}

impl MimePattern {
    fn parse(pattern: &str) -> Self {
        let lower = pattern.to_ascii_lowercase();
        match lower.strip_suffix("/*") {
            Some(prefix) => MimePattern::Prefix(format!("{prefix}/")),
            None => MimePattern::Exact(lower),
        }
    }

    fn matches(&self, mime: &str) -> bool {
        match self {
            MimePattern::Exact(m) => m == mime,
            MimePattern::Prefix(p) => mime.starts_with(p.as_str()),
        }
    }
}

/// Converts an HTTrack-style glob (`*` wildcard, otherwise literal) into an
/// anchored, case-insensitive regex. A pattern with no `*` is treated as a
/// prefix match.
fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let source = if pattern.contains('*') {
        let escaped = regex::escape(pattern).replace("\\*", ".*");
        format!("(?i)^{escaped}$")
    } else {
        format!("(?i)^{}.*", regex::escape(pattern))
    };
    Regex::new(&source)
}

impl Filter {
    /// Compiles a [`FilterSpec`] into matchers. Returns an error if any
    /// include/exclude pattern is not a valid glob.
    pub fn compile(
        spec: &FilterSpec,
        scope: Scope,
        stay_in_dir: bool,
        external_assets: bool,
    ) -> anyhow::Result<Self> {
        let include = spec
            .include
            .iter()
            .map(|p| glob_to_regex(p).map_err(|e| anyhow::anyhow!("invalid include pattern '{p}': {e}")))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let exclude = spec
            .exclude
            .iter()
            .map(|p| glob_to_regex(p).map_err(|e| anyhow::anyhow!("invalid exclude pattern '{p}': {e}")))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self {
            scope,
            stay_in_dir,
            external_assets,
            include,
            exclude,
            mime_include: spec.mime_include.iter().map(|p| MimePattern::parse(p)).collect(),
            mime_exclude: spec.mime_exclude.iter().map(|p| MimePattern::parse(p)).collect(),
            min_size: spec.min_size,
            max_size: spec.max_size,
        })
    }

    fn excluded(&self, url: &str) -> bool {
        self.exclude.iter().any(|re| re.is_match(url))
    }

    fn included(&self, url: &str) -> bool {
        self.include.is_empty() || self.include.iter().any(|re| re.is_match(url))
    }

    /// Whether a page URL may be followed for link discovery.
    #[must_use]
    pub fn should_follow(&self, candidate: &url::Url, root: &url::Url) -> bool {
        in_scope(candidate, root, self.scope, self.stay_in_dir)
            && !self.excluded(candidate.as_str())
            && self.included(candidate.as_str())
    }

    /// Whether an asset URL may be fetched at all (it may still be rejected
    /// by [`Filter::should_save`] once its MIME/size is known).
    #[must_use]
    pub fn should_download_asset(&self, candidate: &url::Url, root: &url::Url) -> bool {
        if self.external_assets {
            !self.excluded(candidate.as_str())
        } else {
            self.should_follow(candidate, root)
        }
    }

    /// Whether a fetched asset passes MIME and size constraints.
    #[must_use]
    pub fn should_save(&self, candidate: &url::Url, root: &url::Url, mime: &str, size: u64) -> bool {
        if !self.should_download_asset(candidate, root) {
            return false;
        }
        let mime = mime.split(';').next().unwrap_or(mime).trim().to_ascii_lowercase();
        if !mime.is_empty() {
            if self.mime_exclude.iter().any(|p| p.matches(&mime)) {
                return false;
            }
            if !self.mime_include.is_empty() && !self.mime_include.iter().any(|p| p.matches(&mime)) {
                return false;
            }
        }
        if let Some(min) = self.min_size
            && size < min
        {
            return false;
        }
        if let Some(max) = self.max_size
            && size > max
        {
            return false;
        }
        true
    }
}
