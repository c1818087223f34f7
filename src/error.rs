//! Error types for mailfetch
//!
//! The library follows a continue-on-error policy: most of these errors are
//! caught at the per-link or per-message boundary and turned into log lines
//! and [`DownloadResult`](crate::types::DownloadResult) entries. They still
//! carry enough context to explain what went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mailfetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mailfetch
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "outdir")
        key: Option<String>,
    },

    /// Mail server connection or login problem
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// IMAP protocol error reported by the transport
    #[error("IMAP error: {0}")]
    Imap(#[from] async_imap::error::Error),

    /// Per-link download error
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Mail server connection errors
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// One or more of server, user and pass were not configured
    #[error("missing credentials: {}", missing.join(", "))]
    MissingCredentials {
        /// Names of the configuration keys that were absent
        missing: Vec<&'static str>,
    },

    /// TCP connection to the server failed
    #[error("cannot reach {server}: {reason}")]
    Unreachable {
        /// Server address that was dialed
        server: String,
        /// Underlying failure
        reason: String,
    },

    /// TLS handshake failed
    #[error("TLS handshake with {server} failed: {reason}")]
    Tls {
        /// Server the handshake was attempted with
        server: String,
        /// Underlying failure
        reason: String,
    },

    /// The server rejected the credentials
    #[error("login as {user} rejected: {reason}")]
    LoginRejected {
        /// User name that was refused
        user: String,
        /// Server response
        reason: String,
    },

    /// An operation needed a live session but none exists
    #[error("not connected to IMAP server")]
    NotConnected,
}

/// Download-related errors
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Link does not have the shape of a transfer share link
    #[error("unrecognized transfer link: {link}")]
    UnrecognizedLink {
        /// The offending link
        link: String,
    },

    /// The transfer service did not yield a direct download URL
    #[error("could not resolve {link}: {reason}")]
    Resolution {
        /// The share link being resolved
        link: String,
        /// Why resolution failed
        reason: String,
    },

    /// HTTP request returned a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// Status code received
        status: u16,
    },

    /// The download finished but the expected file is not on disk
    #[error("download did not produce expected file {path}")]
    MissingOutput {
        /// Where the file was expected
        path: PathBuf,
    },
}

/// Archive extraction errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// File is not a readable zip container
    #[error("invalid archive {archive}: {reason}")]
    InvalidArchive {
        /// The archive that could not be opened
        archive: PathBuf,
        /// Reader error
        reason: String,
    },

    /// An entry could not be written out
    #[error("extraction failed for {archive}: {reason}")]
    ExtractionFailed {
        /// The archive being extracted
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// Source archive could not be removed after extraction
    #[error("unable to delete {archive}: {reason}")]
    DeletionFailed {
        /// Archive that was to be deleted
        archive: PathBuf,
        /// The reason deletion failed
        reason: String,
    },
}

impl Error {
    /// Shorthand for a configuration error tied to a key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}
