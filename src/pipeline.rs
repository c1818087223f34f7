//! Sequential download pipeline
//!
//! Each link goes through the same stages, one link at a time:
//! 1. Filter - ignore anything that is not a transfer download link
//! 2. Resolve - ask the backend for the direct URL and a safe file name
//! 3. Download - stream the file into the output directory
//! 4. Verify - check the file is on disk and report its size
//! 5. Extract - unpack it when `unzip` is set (see [`ArchiveHandler`])
//!
//! A failure at any stage is recorded for that link only; the remaining
//! links are always processed.

use crate::config::Config;
use crate::error::{DownloadError, Result};
use crate::extraction::ArchiveHandler;
use crate::transfer::{TransferBackend, is_transfer_link};
use crate::types::{ArchiveStatus, DownloadOutcome, DownloadResult, LinkSet};
use crate::utils::{download_report_line, regular_file_size};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns links into files in the output directory
#[derive(Clone)]
pub struct DownloadPipeline {
    backend: Arc<dyn TransferBackend>,
}

impl DownloadPipeline {
    /// Create a pipeline downloading through `backend`
    pub fn new(backend: Arc<dyn TransferBackend>) -> Self {
        Self { backend }
    }

    /// Process every link in order, returning one result per link
    pub async fn run(&self, links: &LinkSet, config: &Config) -> Vec<DownloadResult> {
        let mut results = Vec::with_capacity(links.len());
        for link in links.iter() {
            let outcome = self.process(link, config).await;
            results.push(DownloadResult {
                link: link.to_string(),
                outcome,
            });
        }
        results
    }

    async fn process(&self, link: &str, config: &Config) -> DownloadOutcome {
        if !is_transfer_link(link) {
            debug!(%link, "not a transfer download link, skipping");
            return DownloadOutcome::Skipped;
        }

        let (file_name, size_bytes) = match self.fetch(link, config).await {
            Ok(done) => done,
            Err(e) => {
                warn!(%link, backend = self.backend.name(), error = %e, "Failed!");
                return DownloadOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        info!("{}", download_report_line(&file_name, size_bytes));

        let archive = if config.unzip {
            Some(unpack(&file_name, config).await)
        } else {
            None
        };

        DownloadOutcome::Downloaded {
            file_name,
            size_bytes,
            archive,
        }
    }

    /// Resolve, download and verify one link; returns file name and size
    async fn fetch(&self, link: &str, config: &Config) -> Result<(String, u64)> {
        let transfer = self.backend.resolve(link).await?;
        info!("Downloading {}.", transfer.file_name);

        tokio::fs::create_dir_all(&config.outdir).await?;
        let written = self.backend.download(&transfer, &config.outdir).await?;
        if written != transfer.file_name {
            debug!(
                expected = %transfer.file_name,
                %written,
                "backend reported a different file name"
            );
        }

        let path = config.outdir.join(&transfer.file_name);
        let size = regular_file_size(&path)
            .await
            .ok_or(DownloadError::MissingOutput { path })?;

        Ok((transfer.file_name, size))
    }
}

async fn unpack(file_name: &str, config: &Config) -> ArchiveStatus {
    match ArchiveHandler::extract(file_name, config).await {
        Ok(report) => ArchiveStatus::Extracted(report),
        Err(e) => {
            warn!(archive = file_name, error = %e, "extraction failed, continuing");
            ArchiveStatus::Failed {
                reason: e.to_string(),
            }
        }
    }
}
