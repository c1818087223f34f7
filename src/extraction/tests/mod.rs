use crate::config::Config;
use crate::error::ArchiveError;
use crate::extraction::*;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a valid ZIP archive containing multiple files
fn create_zip_archive_multi(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options =
        ::zip::write::FileOptions::default().compression_method(::zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        std::io::Write::write_all(&mut writer, content).unwrap();
    }
    writer.finish().unwrap();
}

fn config_for(outdir: &Path, keep_archive: bool) -> Config {
    Config {
        outdir: outdir.to_path_buf(),
        keep_archive,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// ZipExtractor
// ---------------------------------------------------------------------------

#[test]
fn test_zip_extract_preserves_layout() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("photos.zip");
    create_zip_archive_multi(
        &archive,
        &[
            ("readme.txt", b"hello"),
            ("album/2024/beach.jpg", b"jpeg bytes"),
        ],
    );

    let dest = temp_dir.path().join("out");
    let extraction = ZipExtractor::try_extract(&archive, &dest).unwrap();

    assert_eq!(extraction.files.len(), 2);
    assert_eq!(extraction.skipped, 0);
    assert_eq!(std::fs::read(dest.join("readme.txt")).unwrap(), b"hello");
    assert_eq!(
        std::fs::read(dest.join("album/2024/beach.jpg")).unwrap(),
        b"jpeg bytes"
    );
}

#[test]
fn test_zip_extract_creates_directory_entries() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("dirs.zip");
    {
        let file = std::fs::File::create(&archive).unwrap();
        let mut writer = ::zip::ZipWriter::new(file);
        let options = ::zip::write::FileOptions::default();
        writer.add_directory("empty/", options).unwrap();
        writer.finish().unwrap();
    }

    let extraction = ZipExtractor::try_extract(&archive, temp_dir.path()).unwrap();

    assert!(extraction.files.is_empty());
    assert!(temp_dir.path().join("empty").is_dir());
}

#[test]
fn test_zip_extract_skips_entries_escaping_destination() {
    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().join("out");
    std::fs::create_dir_all(&dest).unwrap();
    let archive = dest.join("evil.zip");
    create_zip_archive_multi(
        &archive,
        &[
            ("../escaped.txt", b"nope"),
            ("/etc/absolute.txt", b"nope"),
            ("safe.txt", b"ok"),
        ],
    );

    let extraction = ZipExtractor::try_extract(&archive, &dest).unwrap();

    assert_eq!(extraction.skipped, 2);
    assert_eq!(extraction.files, vec![dest.join("safe.txt")]);
    assert!(!temp_dir.path().join("escaped.txt").exists());
    assert!(!dest.join("etc/absolute.txt").exists());
}

#[test]
fn test_zip_extract_rejects_non_zip() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("notes.zip");
    std::fs::write(&archive, b"this is not a zip file").unwrap();

    let result = ZipExtractor::try_extract(&archive, temp_dir.path());

    assert!(matches!(result, Err(ArchiveError::InvalidArchive { .. })));
}

#[test]
fn test_zip_extract_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nonexistent.zip");
    let result = ZipExtractor::try_extract(&missing, temp_dir.path());
    assert!(matches!(result, Err(ArchiveError::InvalidArchive { .. })));
}

// ---------------------------------------------------------------------------
// ArchiveHandler
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_handler_keeps_archive_by_default() {
    let temp_dir = TempDir::new().unwrap();
    create_zip_archive_multi(
        &temp_dir.path().join("transfer.zip"),
        &[("docs/report.pdf", b"%PDF-1.7")],
    );

    let config = config_for(temp_dir.path(), true);
    let report = ArchiveHandler::extract("transfer.zip", &config).await.unwrap();

    assert_eq!(report.extracted, vec![temp_dir.path().join("docs/report.pdf")]);
    assert!(!report.archive_removed);
    assert!(temp_dir.path().join("transfer.zip").exists());
    assert!(temp_dir.path().join("docs/report.pdf").exists());
}

#[tokio::test]
async fn test_handler_removes_archive_when_not_kept() {
    let temp_dir = TempDir::new().unwrap();
    create_zip_archive_multi(&temp_dir.path().join("transfer.zip"), &[("a.txt", b"a")]);

    let config = config_for(temp_dir.path(), false);
    let report = ArchiveHandler::extract("transfer.zip", &config).await.unwrap();

    assert!(report.archive_removed);
    assert!(!temp_dir.path().join("transfer.zip").exists());
    assert_eq!(std::fs::read(temp_dir.path().join("a.txt")).unwrap(), b"a");
}

#[tokio::test]
async fn test_handler_deletion_failure_still_succeeds() {
    let temp_dir = TempDir::new().unwrap();
    create_zip_archive_multi(
        &temp_dir.path().join("transfer.zip"),
        &[("docs/notes.txt", b"notes")],
    );

    let config = config_for(temp_dir.path(), false);
    let report = ArchiveHandler::extract_with("transfer.zip", &config, |archive| async move {
        Err(ArchiveError::DeletionFailed {
            archive,
            reason: "permission denied".into(),
        })
    })
    .await
    .unwrap();

    assert!(!report.archive_removed);
    assert_eq!(report.extracted, vec![temp_dir.path().join("docs/notes.txt")]);
    assert!(temp_dir.path().join("transfer.zip").exists());
    assert_eq!(
        std::fs::read(temp_dir.path().join("docs/notes.txt")).unwrap(),
        b"notes"
    );
}

#[tokio::test]
async fn test_handler_removal_gets_the_archive_path() {
    let temp_dir = TempDir::new().unwrap();
    create_zip_archive_multi(&temp_dir.path().join("transfer.zip"), &[("a.txt", b"a")]);

    let config = config_for(temp_dir.path(), false);
    let expected = temp_dir.path().join("transfer.zip");
    let report = ArchiveHandler::extract_with("transfer.zip", &config, |archive| {
        let matches = archive == expected;
        async move {
            assert!(matches, "removal asked for {archive:?}");
            Ok(())
        }
    })
    .await
    .unwrap();

    assert!(report.archive_removed);
}

#[tokio::test]
async fn test_handler_invalid_archive_is_left_in_place() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("broken.zip"), b"PK but not really").unwrap();

    let config = config_for(temp_dir.path(), false);
    let result = ArchiveHandler::extract("broken.zip", &config).await;

    assert!(matches!(result, Err(ArchiveError::InvalidArchive { .. })));
    assert!(
        temp_dir.path().join("broken.zip").exists(),
        "a failed extraction must not delete the archive"
    );
}
