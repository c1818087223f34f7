//! Archive extraction
//!
//! Downloaded transfers are zip archives. [`ArchiveHandler::extract`] unpacks
//! one of them into the output directory, preserving the archive's internal
//! layout, and removes the archive afterwards unless `keep_archive` is set.
//! Entries whose names would land outside the output directory are skipped.

mod zip;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use zip::{ZipExtraction, ZipExtractor};

use crate::config::Config;
use crate::error::ArchiveError;
use crate::types::ArchiveReport;
use std::path::PathBuf;
use tokio::task::spawn_blocking;
use tracing::{info, warn};

/// Unpacks downloaded archives into the output directory
pub struct ArchiveHandler;

impl ArchiveHandler {
    /// Extract `file_name` (relative to `config.outdir`) into `config.outdir`
    ///
    /// Fails with [`ArchiveError`] when the file is not a readable zip or an
    /// entry cannot be written. Failing to delete the archive afterwards is
    /// logged and reported through [`ArchiveReport::archive_removed`], never
    /// returned as an error.
    pub async fn extract(
        file_name: &str,
        config: &Config,
    ) -> Result<ArchiveReport, ArchiveError> {
        Self::extract_with(file_name, config, remove_archive).await
    }

    /// [`extract`](Self::extract) with the archive removal supplied by the caller
    async fn extract_with<R, Fut>(
        file_name: &str,
        config: &Config,
        remove: R,
    ) -> Result<ArchiveReport, ArchiveError>
    where
        R: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = Result<(), ArchiveError>>,
    {
        let archive_path = config.outdir.join(file_name);
        let dest_path = config.outdir.clone();

        // zip reads are blocking; run them off the reactor but wait for them
        let extraction = {
            let archive_path = archive_path.clone();
            spawn_blocking(move || ZipExtractor::try_extract(&archive_path, &dest_path))
                .await
                .map_err(|e| ArchiveError::ExtractionFailed {
                    archive: config.outdir.join(file_name),
                    reason: format!("extraction task panicked: {e}"),
                })??
        };

        info!(
            archive = file_name,
            files = extraction.files.len(),
            skipped = extraction.skipped,
            "{} extracted.",
            file_name
        );

        let mut report = ArchiveReport {
            extracted: extraction.files,
            skipped_entries: extraction.skipped,
            archive_removed: false,
        };

        if !config.keep_archive {
            match remove(archive_path).await {
                Ok(()) => {
                    info!("{} deleted.", file_name);
                    report.archive_removed = true;
                }
                Err(e) => warn!(error = %e, "Unable to delete {}.", file_name),
            }
        }

        Ok(report)
    }
}

async fn remove_archive(archive_path: PathBuf) -> Result<(), ArchiveError> {
    let removed = tokio::fs::remove_file(&archive_path).await;
    removed.map_err(|e| ArchiveError::DeletionFailed {
        archive: archive_path,
        reason: e.to_string(),
    })
}
