//! File-transfer backends
//!
//! A backend turns a share link scraped from a notification into a direct
//! download URL plus a safe local file name, and streams that file to disk.
//! [`WeTransferClient`] is the production implementation; tests plug in
//! their own through the [`TransferBackend`] trait.

mod wetransfer;

pub use wetransfer::WeTransferClient;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Substring identifying a WeTransfer download page link
pub const DOWNLOAD_PATH_MARKER: &str = "wetransfer.com/downloads";

/// Whether a scraped string looks like a transfer download link
///
/// Anything else picked up by the HTML scrape is ignored by the pipeline.
pub fn is_transfer_link(link: &str) -> bool {
    link.contains(DOWNLOAD_PATH_MARKER)
}

/// A share link resolved to something that can be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTransfer {
    /// The share link as scraped
    pub link: String,
    /// Direct URL of the file
    pub direct_url: url::Url,
    /// File name to save under, already sanitized
    pub file_name: String,
}

/// Resolution and download of transfer links
#[async_trait]
pub trait TransferBackend: Send + Sync {
    /// Resolve a share link to its direct file URL and local file name
    async fn resolve(&self, link: &str) -> Result<ResolvedTransfer>;

    /// Stream the resolved file into `outdir`
    ///
    /// Returns the name of the file written, relative to `outdir`.
    async fn download(&self, transfer: &ResolvedTransfer, outdir: &Path) -> Result<String>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
