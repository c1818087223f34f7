//! Core value types shared between the extractor, the pipeline and the session

use std::collections::HashSet;
use std::path::PathBuf;

/// Deduplicated collection of links, kept in first-seen order
///
/// The notification template repeats each link (as visible text and as an
/// anchor target), so insertions of an already-present link are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl LinkSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a link; returns `false` when it was already present
    pub fn insert(&mut self, link: impl Into<String>) -> bool {
        let link = link.into();
        if self.seen.contains(&link) {
            return false;
        }
        self.seen.insert(link.clone());
        self.order.push(link);
        true
    }

    /// Number of distinct links
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the set holds no links
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether `link` is in the set
    pub fn contains(&self, link: &str) -> bool {
        self.seen.contains(link)
    }

    /// Iterate in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for LinkSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = LinkSet::new();
        for link in iter {
            set.insert(link);
        }
        set
    }
}

impl<S: Into<String>> Extend<S> for LinkSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for link in iter {
            self.insert(link);
        }
    }
}

impl IntoIterator for LinkSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.into_iter()
    }
}

/// Outcome of processing one link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// The link as scraped from the message
    pub link: String,
    /// What happened to it
    pub outcome: DownloadOutcome,
}

/// Per-link outcome recorded by the download pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Not a transfer download link; nothing was attempted
    Skipped,
    /// File landed in the output directory
    Downloaded {
        /// File name inside the output directory
        file_name: String,
        /// Size on disk in bytes
        size_bytes: u64,
        /// Extraction outcome, when unzip is enabled
        archive: Option<ArchiveStatus>,
    },
    /// Resolution or download failed
    Failed {
        /// Human-readable reason
        reason: String,
    },
}

impl DownloadResult {
    /// Whether the link produced a file on disk
    pub fn is_downloaded(&self) -> bool {
        matches!(self.outcome, DownloadOutcome::Downloaded { .. })
    }

    /// Whether the link was ignored as non-matching
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, DownloadOutcome::Skipped)
    }

    /// Whether the link failed
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, DownloadOutcome::Failed { .. })
    }
}

/// What extraction did with a downloaded archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveStatus {
    /// Entries were written to the output directory
    Extracted(ArchiveReport),
    /// The archive could not be extracted
    Failed {
        /// Human-readable reason
        reason: String,
    },
}

/// Summary of a successful extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Files written, as absolute paths under the output directory
    pub extracted: Vec<PathBuf>,
    /// Entries skipped because their names escape the output directory
    pub skipped_entries: usize,
    /// Whether the source archive was deleted afterwards
    pub archive_removed: bool,
}

/// Counters for one unread drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Unread messages returned by the search
    pub messages: usize,
    /// Links that produced a file
    pub downloaded: usize,
    /// Links that failed
    pub failed: usize,
    /// Links ignored as non-matching
    pub skipped: usize,
}

impl FetchReport {
    /// Fold per-link results into the counters
    pub fn record(&mut self, results: &[DownloadResult]) {
        for result in results {
            match result.outcome {
                DownloadOutcome::Skipped => self.skipped += 1,
                DownloadOutcome::Downloaded { .. } => self.downloaded += 1,
                DownloadOutcome::Failed { .. } => self.failed += 1,
            }
        }
    }
}

/// Lifecycle of a [`FetchSession`](crate::session::FetchSession)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No live connection (initial state, or connect failed)
    Disconnected,
    /// Logged in and idle
    Connected,
    /// Draining unread mail
    Fetching,
    /// Connection was closed by `disconnect`
    Closed,
}
