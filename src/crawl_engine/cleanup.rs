//! Browser and resource cleanup functionality
//!
//! This module handles cleanup tasks after crawling is complete.

use anyhow::Result;
use chromiumoxide::Browser;
use log::{debug, warn};

/// Result of cleanup operations
#[derive(Debug, Clone)]
pub enum CleanupResult {
    /// All cleanup operations succeeded
    Success,
    /// Some cleanup operations failed, with error details
    PartialFailure(Vec<String>),
}

/// Clean up browser and Chrome data directory
pub async fn cleanup_browser_and_data(
    mut browser: Browser,
    chrome_data_dir: std::path::PathBuf,
) -> Result<CleanupResult> {
    let mut errors = Vec::new();

    debug!(target: "smippo::cleanup", "Closing browser");
    if let Err(e) = browser.close().await {
        warn!(target: "smippo::cleanup", "Failed to close browser: {e}");
        errors.push(format!("Browser close failed: {e}"));
    } else {
        debug!(target: "smippo::cleanup", "Browser closed successfully");
    }

    // Wait for browser process to fully exit (prevents "not closed manually" warning)
    debug!(target: "smippo::cleanup", "Waiting for browser process to exit");
    if let Err(e) = browser.wait().await {
        warn!(target: "smippo::cleanup", "Failed to wait for browser exit: {e}");
        errors.push(format!("Browser wait failed: {e}"));
    } else {
        debug!(target: "smippo::cleanup", "Browser process exited successfully");
    }

    debug!(target: "smippo::cleanup", "Cleaning up Chrome data directory");
    if let Err(e) = std::fs::remove_dir_all(&chrome_data_dir) {
        warn!(target: "smippo::cleanup", "Failed to clean up Chrome data directory: {e}");
        errors.push(format!("Directory cleanup failed: {e}"));
    } else {
        debug!(target: "smippo::cleanup", "Chrome data directory cleaned up successfully");
    }

    if errors.is_empty() {
        Ok(CleanupResult::Success)
    } else {
        Ok(CleanupResult::PartialFailure(errors))
    }
}
