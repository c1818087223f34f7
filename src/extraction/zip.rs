use crate::error::ArchiveError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Files written by one extraction
#[derive(Debug, Default)]
pub struct ZipExtraction {
    /// Files written, in archive order
    pub files: Vec<PathBuf>,
    /// Entries refused because their names escape the destination
    pub skipped: usize,
}

enum EntryOutcome {
    File(PathBuf),
    Directory,
    Unsafe,
}

/// Archive extractor for ZIP files
pub struct ZipExtractor;

impl ZipExtractor {
    /// Extract a single ZIP entry to disk, creating directories as needed
    fn extract_zip_entry(
        mut file: zip::read::ZipFile,
        dest_path: &Path,
        archive_path: &Path,
    ) -> Result<EntryOutcome, ArchiveError> {
        // enclosed_name rejects absolute names and any `..` component
        let file_path = match file.enclosed_name() {
            Some(path) => dest_path.join(path),
            None => {
                warn!(?archive_path, entry = file.name(), "skipping entry with unsafe path");
                return Ok(EntryOutcome::Unsafe);
            }
        };

        if file.is_dir() {
            std::fs::create_dir_all(&file_path)
                .map_err(|e| failed(archive_path, format!("failed to create directory: {e}")))?;
            return Ok(EntryOutcome::Directory);
        }

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                failed(
                    archive_path,
                    format!("failed to create parent directories: {e}"),
                )
            })?;
        }

        let mut outfile = std::fs::File::create(&file_path)
            .map_err(|e| failed(archive_path, format!("failed to create output file: {e}")))?;
        std::io::copy(&mut file, &mut outfile)
            .map_err(|e| failed(archive_path, format!("failed to extract file: {e}")))?;

        Ok(EntryOutcome::File(file_path))
    }

    /// Extract every entry of `archive_path` below `dest_path`
    ///
    /// The archive file handle lives only for the duration of this call.
    pub fn try_extract(
        archive_path: &Path,
        dest_path: &Path,
    ) -> Result<ZipExtraction, ArchiveError> {
        debug!(?archive_path, ?dest_path, "attempting ZIP extraction");

        std::fs::create_dir_all(dest_path)
            .map_err(|e| failed(archive_path, format!("failed to create destination: {e}")))?;

        let file = std::fs::File::open(archive_path).map_err(|e| ArchiveError::InvalidArchive {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to open archive: {e}"),
        })?;

        let mut archive = zip::ZipArchive::new(file).map_err(|e| ArchiveError::InvalidArchive {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to read ZIP archive: {e}"),
        })?;

        let mut extraction = ZipExtraction::default();

        for i in 0..archive.len() {
            let entry = archive
                .by_index(i)
                .map_err(|e| failed(archive_path, format!("failed to read ZIP entry: {e}")))?;

            match Self::extract_zip_entry(entry, dest_path, archive_path)? {
                EntryOutcome::File(path) => extraction.files.push(path),
                EntryOutcome::Directory => {}
                EntryOutcome::Unsafe => extraction.skipped += 1,
            }
        }

        debug!(
            ?archive_path,
            extracted_count = extraction.files.len(),
            skipped = extraction.skipped,
            "ZIP extraction successful"
        );

        Ok(extraction)
    }
}

fn failed(archive_path: &Path, reason: String) -> ArchiveError {
    ArchiveError::ExtractionFailed {
        archive: archive_path.to_path_buf(),
        reason,
    }
}
