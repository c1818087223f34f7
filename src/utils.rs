//! Utility functions for file names and size reporting

use std::path::Path;

/// Name used when a URL carries no usable file name
const FALLBACK_FILE_NAME: &str = "download";

/// Derive a filesystem-safe file name from a direct download URL
///
/// Takes the last path segment, percent-decodes it and removes anything that
/// could climb out of, or point into a subdirectory of, the output directory
/// (`../`, `/` and `\`).
///
/// # Examples
///
/// ```
/// use mailfetch::utils::safe_file_name;
///
/// let url = url::Url::parse("https://download.wetransfer.com/eu2/abc/My%20Photos.zip?token=x").unwrap();
/// assert_eq!(safe_file_name(&url), "My Photos.zip");
/// ```
pub fn safe_file_name(url: &url::Url) -> String {
    let last_segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    let decoded = urlencoding::decode(last_segment)
        .map(|name| name.into_owned())
        .unwrap_or_else(|_| last_segment.to_string());

    let cleaned = decoded
        .replace("../", "")
        .replace('/', "")
        .replace('\\', "");

    match cleaned.as_str() {
        "" | "." | ".." => FALLBACK_FILE_NAME.to_string(),
        _ => cleaned,
    }
}

/// Size in megabytes (MiB), as shown in download report lines
pub fn size_in_mb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

/// Report line for a finished download: the name padded with dots to 50
/// columns, followed by the size in MB with one decimal
pub fn download_report_line(file_name: &str, bytes: u64) -> String {
    format!("{:.<50}{:5.1} MB", file_name, size_in_mb(bytes))
}

/// Size of a regular file, or `None` when `path` is not one
pub async fn regular_file_size(path: &Path) -> Option<u64> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Some(meta.len()),
        _ => None,
    }
}
