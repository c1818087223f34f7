use super::{MailConnector, MailTransport};
use crate::error::{ConnectionError, Result};
use async_imap::Session;
use async_native_tls::TlsStream;
use async_trait::async_trait;
use futures::StreamExt;
use futures::io::{AsyncRead, AsyncWrite};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::debug;

/// TLS stream handed to the IMAP client
struct ImapStream(TlsStream<Compat<TcpStream>>);

impl AsyncRead for ImapStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.get_mut().0).poll_read(cx, buf)
    }
}

impl AsyncWrite for ImapStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.get_mut().0).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().0).poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().0).poll_close(cx)
    }
}

impl std::fmt::Debug for ImapStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ImapStream")
    }
}

// SAFETY: the TLS adapter only holds a task context pointer for the duration
// of a single poll; the stream is owned by one session and never shared.
unsafe impl Send for ImapStream {}

/// IMAP over implicit TLS
#[derive(Debug, Clone, Copy, Default)]
pub struct ImapConnector;

#[async_trait]
impl MailConnector for ImapConnector {
    async fn connect(
        &self,
        server: &str,
        port: u16,
        username: &str,
        password: &str,
    ) -> Result<Box<dyn MailTransport>> {
        let endpoint = format!("{server}:{port}");

        let tcp = TcpStream::connect((server, port)).await.map_err(|e| {
            ConnectionError::Unreachable {
                server: endpoint.clone(),
                reason: e.to_string(),
            }
        })?;

        let tls = async_native_tls::TlsConnector::new()
            .connect(server, tcp.compat())
            .await
            .map_err(|e| ConnectionError::Tls {
                server: endpoint.clone(),
                reason: e.to_string(),
            })?;
        debug!(%endpoint, "TLS established");

        let session = async_imap::Client::new(ImapStream(tls))
            .login(username, password)
            .await
            .map_err(|(e, _client)| ConnectionError::LoginRejected {
                user: username.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(ImapTransport {
            session,
            selected: false,
        }))
    }
}

/// Logged-in IMAP session
struct ImapTransport {
    session: Session<ImapStream>,
    selected: bool,
}

#[async_trait]
impl MailTransport for ImapTransport {
    async fn select(&mut self, mailbox: &str) -> Result<()> {
        let selected = self.session.select(mailbox).await?;
        debug!(mailbox, exists = selected.exists, "mailbox selected");
        self.selected = true;
        Ok(())
    }

    async fn search_unseen(&mut self) -> Result<Vec<u32>> {
        let mut ids: Vec<u32> = self.session.search("UNSEEN").await?.into_iter().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn fetch_raw(&mut self, id: u32) -> Result<Option<Vec<u8>>> {
        let mut body = None;
        let mut fetches = self.session.fetch(id.to_string(), "RFC822").await?;
        while let Some(fetch) = fetches.next().await {
            let fetch = fetch?;
            if body.is_none() {
                body = fetch.body().map(<[u8]>::to_vec);
            }
        }
        Ok(body)
    }

    async fn close(&mut self) -> Result<()> {
        if self.selected {
            self.session.close().await?;
            self.selected = false;
        }
        self.session.logout().await?;
        Ok(())
    }
}
