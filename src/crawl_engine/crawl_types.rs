//! Core types used throughout the crawl engine: the error taxonomy, the
//! queue item, and failure classification for retry decisions.

use anyhow::Result;
use std::fmt;

/// Custom error type for crawl operations
#[derive(Debug, Clone)]
pub enum CrawlError {
    /// Configuration error
    ConfigError(String),
    /// Browser error
    BrowserError(String),
    /// Network error
    NetworkError(String),
    /// Operation cancelled
    Cancelled,
    /// Other errors
    Other(String),
}

impl fmt::Display for CrawlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            Self::BrowserError(msg) => write!(f, "Browser error: {msg}"),
            Self::NetworkError(msg) => write!(f, "Network error: {msg}"),
            Self::Cancelled => write!(f, "Crawl operation was cancelled"),
            Self::Other(msg) => write!(f, "Crawl error: {msg}"),
        }
    }
}

impl std::error::Error for CrawlError {}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        // Use {:#} to preserve full error chain with context
        Self::Other(format!("{err:#}"))
    }
}

/// Convenience alias for Result with `CrawlError`
pub type CrawlResult<T> = Result<T, CrawlError>;

use serde::{Deserialize, Serialize};

/// Represents an item in the crawl queue with URL and depth tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlQueue {
    pub url: String,
    pub depth: u8,
    /// Number of retry attempts for this URL (0 = first attempt)
    #[serde(default)]
    pub retry_count: u8,
}

/// Categorizes page failures for intelligent retry decisions
///
/// Different failure types have different retry characteristics:
/// - Network errors are usually transient → high retry value
/// - Browser errors may recover with backoff → medium retry value  
/// - Content errors are usually permanent → low/no retry value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network-level failure (timeout, DNS, connection refused)
    /// High retry value - usually transient
    Network,
    /// Browser/page failure (crash, resource exhaustion, CDP error)
    /// Medium retry value - may recover with backoff
    Browser,
    /// Content extraction failure (invalid HTML, missing elements)
    /// Low retry value - unlikely to recover
    ContentExtraction,
    /// Rate limiting detected (HTTP 429)
    /// Special handling - use longer backoff
    RateLimited,
    /// Unknown/unclassified error
    Unknown,
}

impl FailureKind {
    /// Classify an error into a failure kind based on error message patterns
    #[must_use]
    pub fn classify(error: &anyhow::Error) -> Self {
        let msg = error.to_string().to_lowercase();
        
        // Rate limiting (highest priority check)
        if msg.contains("429") || msg.contains("too many requests") || msg.contains("rate limit") {
            return Self::RateLimited;
        }
        
        // Network errors (high retry value)
        if msg.contains("timeout") || msg.contains("timed out") ||
           msg.contains("connection refused") || msg.contains("connection reset") ||
           msg.contains("dns") || msg.contains("network") ||
           msg.contains("unreachable") || msg.contains("eof") {
            return Self::Network;
        }
        
        // Browser/CDP errors (medium retry value)
        if msg.contains("browser") || msg.contains("page") || 
           msg.contains("chrome") || msg.contains("cdp") ||
           msg.contains("target") || msg.contains("session") {
            return Self::Browser;
        }
        
        // Content errors (low retry value)
        if msg.contains("extract") || msg.contains("validation") ||
           msg.contains("content") || msg.contains("html") ||
           msg.contains("parse") || msg.contains("selector") {
            return Self::ContentExtraction;
        }
        
        Self::Unknown
    }
    
    /// Whether this failure kind should be retried by default
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network | Self::Browser | Self::RateLimited | Self::Unknown => true,
            Self::ContentExtraction => false,  // Usually permanent
        }
    }
    
    /// Base delay multiplier for this failure kind
    #[must_use]
    pub const fn delay_multiplier(&self) -> f64 {
        match self {
            Self::Network => 1.0,
            Self::Browser => 1.5,
            Self::RateLimited => 3.0,  // Longer backoff for rate limits
            Self::ContentExtraction | Self::Unknown => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rate_limited_before_network() {
        let err = anyhow::anyhow!("429 Too Many Requests: connection timeout");
        assert_eq!(FailureKind::classify(&err), FailureKind::RateLimited);
    }

    #[test]
    fn classifies_network_errors() {
        let err = anyhow::anyhow!("navigation timed out after 30s");
        assert_eq!(FailureKind::classify(&err), FailureKind::Network);
    }

    #[test]
    fn classifies_browser_errors() {
        let err = anyhow::anyhow!("CDP session closed unexpectedly");
        assert_eq!(FailureKind::classify(&err), FailureKind::Browser);
    }

    #[test]
    fn classifies_content_errors() {
        let err = anyhow::anyhow!("failed to parse html selector");
        assert_eq!(FailureKind::classify(&err), FailureKind::ContentExtraction);
    }

    #[test]
    fn unmatched_errors_are_unknown() {
        let err = anyhow::anyhow!("something unexpected happened");
        assert_eq!(FailureKind::classify(&err), FailureKind::Unknown);
    }

    #[test]
    fn content_extraction_is_not_retried_by_default() {
        assert!(!FailureKind::ContentExtraction.is_retryable());
        assert!(FailureKind::Network.is_retryable());
        assert!(FailureKind::RateLimited.is_retryable());
    }
}
