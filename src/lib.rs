//! # mailfetch
//!
//! Fetches files announced by WeTransfer notification emails.
//!
//! A [`FetchSession`] logs into an IMAP mailbox over TLS, reads every unread
//! message, scrapes the download links out of its HTML body, downloads each
//! transfer into the output directory and, optionally, unpacks the archive.
//! Processing is strictly sequential, and a failure on one message or link is
//! logged and never aborts the rest of the batch.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailfetch::{Config, FetchSession};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         server: Some("imap.example.com".to_string()),
//!         username: Some("me@example.com".to_string()),
//!         password: Some("app-password".to_string()),
//!         keep_archive: false,
//!         ..Default::default()
//!     };
//!
//!     let mut session = FetchSession::new(config)?;
//!     if session.connect().await {
//!         let report = session.fetch_unread().await;
//!         println!("downloaded {} file(s)", report.downloaded);
//!         session.disconnect().await;
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Archive extraction
pub mod extraction;
/// Link extraction from notification HTML
pub mod links;
/// Log output setup
pub mod logging;
/// Mail message abstraction
pub mod message;
/// Per-link download pipeline
pub mod pipeline;
/// Mailbox session lifecycle
pub mod session;
/// File-transfer backends
pub mod transfer;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{Config, ConfigOverrides};
pub use error::{ArchiveError, ConnectionError, DownloadError, Error, Result};
pub use extraction::ArchiveHandler;
pub use links::{LinkExtractor, LinkRule};
pub use message::{MailMessage, MessagePart};
pub use pipeline::DownloadPipeline;
pub use session::{FetchSession, ImapConnector, MailConnector, MailTransport};
pub use transfer::{ResolvedTransfer, TransferBackend, WeTransferClient};
pub use types::{
    ArchiveReport, ArchiveStatus, DownloadOutcome, DownloadResult, FetchReport, LinkSet,
    SessionState,
};

use std::time::Duration;

/// Upper bound on the logout that follows an interrupted drain
pub const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Drain unread mail once, stopping early on a termination signal
///
/// The session is disconnected afterwards either way. Returns `None` when a
/// signal interrupted the drain.
///
/// # Example
///
/// ```no_run
/// use mailfetch::{Config, FetchSession, fetch_with_shutdown};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut session = FetchSession::new(Config::load("mailfetch.toml".as_ref())?)?;
///     if session.connect().await {
///         fetch_with_shutdown(&mut session).await;
///     }
///     Ok(())
/// }
/// ```
pub async fn fetch_with_shutdown(session: &mut FetchSession) -> Option<FetchReport> {
    fetch_until(session, wait_for_signal(), DISCONNECT_TIMEOUT).await
}

/// Drain unread mail once unless `shutdown` resolves first
///
/// The disconnect that follows is given at most `disconnect_timeout`; a
/// server that stops answering is abandoned rather than waited on.
pub async fn fetch_until<F>(
    session: &mut FetchSession,
    shutdown: F,
    disconnect_timeout: Duration,
) -> Option<FetchReport>
where
    F: Future<Output = ()>,
{
    let report = tokio::select! {
        report = session.fetch_unread() => Some(report),
        _ = shutdown => None,
    };

    if tokio::time::timeout(disconnect_timeout, session.disconnect())
        .await
        .is_err()
    {
        tracing::warn!(
            timeout = ?disconnect_timeout,
            "Logout did not finish in time, dropping the connection"
        );
    }
    report
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, stopping fetch");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT (Ctrl+C), stopping fetch");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if tokio::signal::ctrl_c().await.is_err() {
                // no way to observe a signal; let the fetch run to completion
                std::future::pending::<()>().await;
            }
            tracing::info!("Received Ctrl+C, stopping fetch");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C, stopping fetch");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}
