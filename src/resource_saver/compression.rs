use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use flate2::{Compression, GzBuilder};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::time::Duration as StdDuration;
use tempfile::NamedTempFile;
use tokio::time::timeout;

const BLOCKING_COMPRESSION_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Content-Type headers in the wild stay well under this; a longer one is
/// truncated rather than stored verbatim in the gzip comment field.
const MAX_CONTENT_TYPE_LEN: usize = 512;

/// Gzip comment field maximum size per RFC 1952.
const MAX_METADATA_JSON_LEN: usize = 60_000;

/// Keeps the MIME type and `charset` parameter of a `Content-Type` header,
/// dropping everything else, truncating if it's still over the limit.
fn sanitize_content_type(raw: &str) -> String {
    if raw.len() <= MAX_CONTENT_TYPE_LEN {
        return raw.to_string();
    }

    let parts: Vec<&str> = raw.split(';').collect();
    let mut result = parts[0].trim().to_string();

    for part in &parts[1..] {
        let part = part.trim();
        if part.starts_with("charset=") {
            result.push_str("; ");
            result.push_str(part);
            break;
        }
    }

    if result.len() > MAX_CONTENT_TYPE_LEN {
        result.truncate(MAX_CONTENT_TYPE_LEN);
        log::warn!("Content-Type still over {MAX_CONTENT_TYPE_LEN} bytes after parsing, truncated");
    }

    result
}

/// Cache metadata stored alongside (gzip comment field) or beside a saved resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub etag: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_modified: DateTime<Utc>,
    pub content_type: String,
}

/// Saves `content` to `path`, gzip-compressing to a `.gz` sibling when
/// `compress` is set. Returns the actual path written and its metadata.
pub async fn save_compressed_file(
    content: Vec<u8>,
    path: &Path,
    content_type: &str,
    compress: bool,
    _compression_threshold: usize,
) -> Result<(std::path::PathBuf, CacheMetadata)> {
    let path = path.to_path_buf();
    
    // SECURITY: Sanitize content_type BEFORE creating metadata
    // This prevents DoS attacks via oversized Content-Type headers
    let content_type = sanitize_content_type(content_type);

    // Calculate XXHash for etag (unchanged)
    let hash = xxhash_rust::xxh3::xxh3_64(&content);
    let etag = format!("\"{hash:x}\"");

    // Set cache control headers (unchanged)
    let now = Utc::now();
    let expires = now + Duration::seconds(7 * 24 * 60 * 60);

    let metadata = CacheMetadata {
        etag,
        expires,
        last_modified: now,
        content_type,
    };

    if compress {
        let gz_path = path.with_extension(format!(
            "{}.gz",
            path.extension().unwrap_or_default().to_str().unwrap_or("")
        ));

        let parent_dir = gz_path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Path has no parent directory"))?;

        let metadata_json = serde_json::to_string(&metadata)?;
        debug_assert!(
            metadata_json.len() <= MAX_METADATA_JSON_LEN,
            "Metadata JSON unexpectedly large: {} bytes (content_type: {:?})",
            metadata_json.len(),
            metadata.content_type
        );

        let filename_str = path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Missing filename"))?
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid filename encoding"))?
            .to_string();

        let gz_path_clone = gz_path.clone();
        let parent_dir_clone = parent_dir.to_path_buf();
        let filename_clone = filename_str.clone();
        let metadata_json_clone = metadata_json.clone();
        let gz_path_for_log = gz_path_clone.clone();
        let content_len = content.len();

        let blocking_task = tokio::task::spawn_blocking(move || -> Result<()> {
            let temp_file = NamedTempFile::new_in(&parent_dir_clone)?;
            let mut gz = GzBuilder::new()
                .filename(filename_clone)
                .comment(metadata_json_clone)
                .write(temp_file, Compression::new(3));
            gz.write_all(&content)?;
            let temp_file = gz.finish()?;
            temp_file.persist(&gz_path_clone)?;
            Ok(())
        });

        match timeout(BLOCKING_COMPRESSION_TIMEOUT, blocking_task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => return Err(anyhow::anyhow!("Blocking compression task panicked: {}", e)),
            Err(_) => {
                log::warn!(
                    "Blocking compression timeout for file: {:?} (size: {} bytes, timeout: {:?})",
                    gz_path_for_log,
                    content_len,
                    BLOCKING_COMPRESSION_TIMEOUT
                );
                return Err(anyhow::anyhow!(
                    "Compression timed out after {:?}",
                    BLOCKING_COMPRESSION_TIMEOUT
                ));
            }
        }

        Ok((gz_path, metadata))
    } else {
        let parent_dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Path has no parent directory"))?;

        let mut temp_file = NamedTempFile::new_in(parent_dir)?;
        temp_file.write_all(&content)?;
        temp_file.persist(&path)?;

        Ok((path.clone(), metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_content_type_passes_short_headers_through() {
        assert_eq!(sanitize_content_type("text/html; charset=utf-8"), "text/html; charset=utf-8");
    }

    #[test]
    fn sanitize_content_type_truncates_oversized_headers() {
        let malicious = format!("text/html; charset=utf-8; {}", "junk;".repeat(200));
        let result = sanitize_content_type(&malicious);
        assert!(result.len() <= MAX_CONTENT_TYPE_LEN);
        assert!(result.starts_with("text/html"));
        assert!(result.contains("charset=utf-8"));
    }

    #[tokio::test]
    async fn uncompressed_round_trip_preserves_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        let (saved_path, metadata) =
            save_compressed_file(b"<html></html>".to_vec(), &path, "text/html", false, 0).await.unwrap();
        assert_eq!(saved_path, path);
        assert_eq!(tokio::fs::read(&saved_path).await.unwrap(), b"<html></html>");
        assert_eq!(metadata.content_type, "text/html");
    }

    #[tokio::test]
    async fn compressed_output_is_gzip_and_sibling_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        let (saved_path, _) =
            save_compressed_file(b"hello world".to_vec(), &path, "text/plain", true, 0).await.unwrap();
        assert_eq!(saved_path, dir.path().join("page.html.gz"));
        let raw = tokio::fs::read(&saved_path).await.unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    }
}
