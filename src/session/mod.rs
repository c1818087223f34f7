//! Mail session lifecycle
//!
//! [`FetchSession`] owns one authenticated mailbox connection and drives the
//! rest of the crate from it: every unread message is parsed, its links are
//! extracted, and the links are handed to the [`DownloadPipeline`].
//!
//! The connection itself sits behind two traits so the session can be driven
//! without a real server:
//! - [`MailConnector`] dials and logs in, yielding a transport
//! - [`MailTransport`] is the small set of mailbox commands the session uses
//!
//! [`ImapConnector`] is the IMAP-over-TLS implementation used by default.

mod imap;

pub use imap::ImapConnector;

use crate::config::Config;
use crate::error::{ConnectionError, Result};
use crate::links::LinkExtractor;
use crate::pipeline::DownloadPipeline;
use crate::transfer::{TransferBackend, WeTransferClient};
use crate::types::{FetchReport, SessionState};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Opens authenticated mailbox connections
#[async_trait]
pub trait MailConnector: Send + Sync {
    /// Connect to `server:port` and log in
    async fn connect(
        &self,
        server: &str,
        port: u16,
        username: &str,
        password: &str,
    ) -> Result<Box<dyn MailTransport>>;
}

/// Commands issued against a logged-in mailbox
#[async_trait]
pub trait MailTransport: Send {
    /// Select the mailbox to operate on
    async fn select(&mut self, mailbox: &str) -> Result<()>;

    /// Ids of unread messages in the selected mailbox, ascending
    async fn search_unseen(&mut self) -> Result<Vec<u32>>;

    /// Full RFC 822 bytes of a message
    ///
    /// Fetching marks the message as read on the server. `None` means the
    /// server answered without a body.
    async fn fetch_raw(&mut self, id: u32) -> Result<Option<Vec<u8>>>;

    /// Close the selected mailbox and log out
    async fn close(&mut self) -> Result<()>;
}

/// One mailbox connection and the processing wired to it
pub struct FetchSession {
    config: Config,
    connector: Box<dyn MailConnector>,
    extractor: LinkExtractor,
    pipeline: DownloadPipeline,
    transport: Option<Box<dyn MailTransport>>,
    state: SessionState,
}

impl FetchSession {
    /// Create a disconnected session using IMAP over TLS and WeTransfer
    pub fn new(config: Config) -> Result<Self> {
        let backend = Arc::new(WeTransferClient::new()?);
        Ok(Self::with_parts(config, Box::new(ImapConnector), backend))
    }

    /// Create a disconnected session from explicit collaborators
    pub fn with_parts(
        config: Config,
        connector: Box<dyn MailConnector>,
        backend: Arc<dyn TransferBackend>,
    ) -> Self {
        Self {
            config,
            connector,
            extractor: LinkExtractor::default(),
            pipeline: DownloadPipeline::new(backend),
            transport: None,
            state: SessionState::Disconnected,
        }
    }

    /// Replace the link extractor
    pub fn with_extractor(mut self, extractor: LinkExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Build a session, connect, and drain unread mail if `autostart` is set
    ///
    /// Connection failures are logged; the returned session is then simply
    /// not connected.
    pub async fn open(config: Config) -> Result<Self> {
        Ok(Self::new(config)?.start().await)
    }

    /// Connect, then drain unread mail if `autostart` is set
    pub async fn start(mut self) -> Self {
        if self.connect().await && self.config.autostart {
            self.fetch_unread().await;
        }
        self
    }

    /// The effective configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a logged-in connection is held
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Connect and log in; returns whether a connection is now held
    ///
    /// Missing credentials short-circuit before any network activity.
    pub async fn connect(&mut self) -> bool {
        if self.is_connected() {
            debug!("already connected");
            return true;
        }

        let missing = self.config.missing_credentials();
        if !missing.is_empty() {
            warn!("{}", ConnectionError::MissingCredentials { missing });
            return false;
        }

        let (Some(server), Some(username), Some(password)) = (
            self.config.server.as_deref(),
            self.config.username.as_deref(),
            self.config.password.as_deref(),
        ) else {
            return false;
        };

        debug!(server, port = self.config.port, "connecting");
        match self
            .connector
            .connect(server, self.config.port, username, password)
            .await
        {
            Ok(transport) => {
                info!("Logged in on {} as {}.", server, username);
                self.transport = Some(transport);
                self.state = SessionState::Connected;
                true
            }
            Err(e) => {
                error!("Login failed: {}.", e);
                self.state = SessionState::Disconnected;
                false
            }
        }
    }

    /// Drain every unread message in the configured mailbox
    ///
    /// Without a connection this logs an error and does nothing. Failures on
    /// one message or link never stop the drain.
    pub async fn fetch_unread(&mut self) -> FetchReport {
        if !self.is_connected() {
            error!("Error, {}!", ConnectionError::NotConnected);
            return FetchReport::default();
        }

        self.state = SessionState::Fetching;
        let report = match self.transport.as_deref_mut() {
            Some(transport) => {
                drain(transport, &self.config, &self.extractor, &self.pipeline).await
            }
            None => FetchReport::default(),
        };
        self.state = SessionState::Connected;

        info!(
            messages = report.messages,
            downloaded = report.downloaded,
            failed = report.failed,
            skipped = report.skipped,
            "fetch complete"
        );
        report
    }

    /// Close the mailbox and log out
    ///
    /// Does nothing when no connection is held, so it is safe to call twice.
    pub async fn disconnect(&mut self) {
        let Some(mut transport) = self.transport.take() else {
            debug!("not connected, nothing to disconnect");
            return;
        };
        // closed even if the logout below is abandoned part way
        self.state = SessionState::Closed;

        if let Err(e) = transport.close().await {
            warn!(error = %e, "error while closing the mailbox");
        }
        info!("Disconnected from {}.", self.config.server_label());
    }
}

async fn drain(
    transport: &mut dyn MailTransport,
    config: &Config,
    extractor: &LinkExtractor,
    pipeline: &DownloadPipeline,
) -> FetchReport {
    let mut report = FetchReport::default();

    if let Err(e) = transport.select(&config.mailbox).await {
        error!(mailbox = %config.mailbox, error = %e, "cannot select mailbox");
        return report;
    }

    let ids = match transport.search_unseen().await {
        Ok(ids) => ids,
        Err(e) => {
            error!(error = %e, "unread search failed");
            return report;
        }
    };
    report.messages = ids.len();
    debug!(count = ids.len(), mailbox = %config.mailbox, "unread messages");

    for id in ids {
        let raw = match transport.fetch_raw(id).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                warn!(id, "server returned no body");
                continue;
            }
            Err(e) => {
                warn!(id, error = %e, "cannot fetch message");
                continue;
            }
        };

        let links = match mailparse::parse_mail(&raw) {
            Ok(parsed) => extractor.extract(&parsed),
            Err(e) => {
                warn!(id, error = %e, "Unable to parse message!");
                continue;
            }
        };
        if links.is_empty() {
            continue;
        }

        let results = pipeline.run(&links, config).await;
        report.record(&results);
    }

    report
}
