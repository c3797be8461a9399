//! Shared test helpers for the smippo integration suite.

use anyhow::Result;
use mockito::{Mock, Server};
use std::path::Path;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn create_test_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Minimal HTML escaping sufficient for test fixture titles (no external
/// crate dependency needed for this one call site).
fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[allow(dead_code)]
pub fn create_test_html(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{}</title>
</head>
<body>
    {}
</body>
</html>"#,
        escape(title),
        body
    )
}

#[allow(dead_code)]
pub async fn setup_mock_server() -> Result<mockito::ServerGuard> {
    let server = Server::new_async().await;
    Ok(server)
}

#[allow(dead_code)]
pub fn create_html_mock(server: &mut Server, path: &str, html: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(html)
        .create()
}

#[allow(dead_code)]
pub fn create_redirect_mock(server: &mut Server, from: &str, to: &str) -> Mock {
    server
        .mock("GET", from)
        .with_status(301)
        .with_header("location", to)
        .create()
}

#[allow(dead_code)]
pub fn create_error_mock(server: &mut Server, path: &str, status: usize) -> Mock {
    server.mock("GET", path).with_status(status).with_body("Error").create()
}

/// Builds a `CrawlConfig` pointed at `storage_dir`/`start_url` with sane,
/// fast-failing test defaults (no robots fetch, single worker).
#[allow(dead_code)]
pub fn create_test_config(storage_dir: &Path, start_url: &str) -> smippo::CrawlConfig {
    smippo::CrawlConfig::builder()
        .output_dir(storage_dir.to_path_buf())
        .start_url(start_url)
        .max_pages(10)
        .ignore_robots(true)
        .build()
        .expect("failed to build test CrawlConfig")
}

#[allow(dead_code)]
pub fn create_robots_txt(disallow_paths: &[&str]) -> String {
    let mut content = String::from("User-agent: *\n");
    for path in disallow_paths {
        content.push_str(&format!("Disallow: {path}\n"));
    }
    content
}

#[allow(dead_code)]
pub fn test_url(server: &Server, path: &str) -> String {
    format!("{}{}", server.url(), path)
}

#[allow(dead_code)]
pub async fn assert_file_exists_with_content(path: &Path) -> Result<String> {
    assert!(path.exists(), "File does not exist: {path:?}");
    let content = tokio::fs::read_to_string(path).await?;
    assert!(!content.is_empty(), "File is empty: {path:?}");
    Ok(content)
}

#[allow(dead_code)]
pub fn count_files_recursive(dir: &Path) -> futures::future::BoxFuture<'_, Result<usize>> {
    Box::pin(async move {
        let mut count = 0;
        let mut entries = tokio::fs::read_dir(dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_file() {
                count += 1;
            } else if path.is_dir() {
                count += count_files_recursive(&path).await?;
            }
        }

        Ok(count)
    })
}
