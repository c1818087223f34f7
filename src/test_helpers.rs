//! Shared fakes for unit tests
//!
//! - [`FakeBackend`] serves canned files for known links
//! - [`FakeConnector`] hands out transports over an in-memory mailbox

use crate::error::{ConnectionError, DownloadError, Result};
use crate::session::{MailConnector, MailTransport};
use crate::transfer::{ResolvedTransfer, TransferBackend};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Transfer backend answering from a fixed table of links
#[derive(Default)]
pub(crate) struct FakeBackend {
    // None: the download "succeeds" without writing anything
    files: HashMap<String, (String, Option<Vec<u8>>)>,
    calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn serving(mut self, link: &str, file_name: &str, bytes: Vec<u8>) -> Self {
        self.files
            .insert(link.to_string(), (file_name.to_string(), Some(bytes)));
        self
    }

    pub(crate) fn vanishing(mut self, link: &str, file_name: &str) -> Self {
        self.files
            .insert(link.to_string(), (file_name.to_string(), None));
        self
    }

    /// Links passed to `resolve`, in call order
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransferBackend for FakeBackend {
    async fn resolve(&self, link: &str) -> Result<ResolvedTransfer> {
        self.calls.lock().unwrap().push(link.to_string());
        let (file_name, _) = self
            .files
            .get(link)
            .ok_or_else(|| DownloadError::Resolution {
                link: link.to_string(),
                reason: "unknown transfer".into(),
            })?;
        Ok(ResolvedTransfer {
            link: link.to_string(),
            direct_url: url::Url::parse("https://files.example.test/blob")
                .unwrap()
                .join(file_name)
                .unwrap(),
            file_name: file_name.clone(),
        })
    }

    async fn download(&self, transfer: &ResolvedTransfer, outdir: &Path) -> Result<String> {
        if let Some((file_name, Some(bytes))) = self.files.get(&transfer.link) {
            tokio::fs::write(outdir.join(file_name), bytes).await?;
        }
        Ok(transfer.file_name.clone())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Default)]
struct Mailbox {
    // (id, raw message, seen)
    messages: Vec<(u32, Vec<u8>, bool)>,
    reject_login: bool,
    dials: usize,
    closes: usize,
    last_endpoint: Option<(String, u16, String)>,
}

/// Connector backed by an in-memory mailbox shared between clones
#[derive(Clone, Default)]
pub(crate) struct FakeConnector {
    mailbox: Arc<Mutex<Mailbox>>,
}

impl FakeConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn rejecting(self) -> Self {
        self.mailbox.lock().unwrap().reject_login = true;
        self
    }

    /// Add an unread message; ids are assigned from 1 upwards
    pub(crate) fn with_message(self, raw: Vec<u8>) -> Self {
        {
            let mut mailbox = self.mailbox.lock().unwrap();
            let id = mailbox.messages.len() as u32 + 1;
            mailbox.messages.push((id, raw, false));
        }
        self
    }

    pub(crate) fn dial_count(&self) -> usize {
        self.mailbox.lock().unwrap().dials
    }

    pub(crate) fn close_count(&self) -> usize {
        self.mailbox.lock().unwrap().closes
    }

    pub(crate) fn unread_count(&self) -> usize {
        let mailbox = self.mailbox.lock().unwrap();
        mailbox.messages.iter().filter(|(_, _, seen)| !seen).count()
    }

    pub(crate) fn last_endpoint(&self) -> Option<(String, u16, String)> {
        self.mailbox.lock().unwrap().last_endpoint.clone()
    }
}

#[async_trait]
impl MailConnector for FakeConnector {
    async fn connect(
        &self,
        server: &str,
        port: u16,
        username: &str,
        _password: &str,
    ) -> Result<Box<dyn MailTransport>> {
        let reject = {
            let mut mailbox = self.mailbox.lock().unwrap();
            mailbox.dials += 1;
            mailbox.last_endpoint = Some((server.to_string(), port, username.to_string()));
            mailbox.reject_login
        };
        if reject {
            return Err(ConnectionError::LoginRejected {
                user: username.to_string(),
                reason: "AUTHENTICATIONFAILED".into(),
            }
            .into());
        }
        Ok(Box::new(FakeTransport {
            mailbox: self.mailbox.clone(),
        }))
    }
}

struct FakeTransport {
    mailbox: Arc<Mutex<Mailbox>>,
}

#[async_trait]
impl MailTransport for FakeTransport {
    async fn select(&mut self, _mailbox: &str) -> Result<()> {
        Ok(())
    }

    async fn search_unseen(&mut self) -> Result<Vec<u32>> {
        let mailbox = self.mailbox.lock().unwrap();
        Ok(mailbox
            .messages
            .iter()
            .filter(|(_, _, seen)| !seen)
            .map(|(id, _, _)| *id)
            .collect())
    }

    async fn fetch_raw(&mut self, id: u32) -> Result<Option<Vec<u8>>> {
        let mut mailbox = self.mailbox.lock().unwrap();
        Ok(mailbox
            .messages
            .iter_mut()
            .find(|(message_id, _, _)| *message_id == id)
            .map(|(_, raw, seen)| {
                *seen = true;
                raw.clone()
            }))
    }

    async fn close(&mut self) -> Result<()> {
        self.mailbox.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// A transfer notification carrying `links` in both span text and anchors
pub(crate) fn notification_email(links: &[&str]) -> Vec<u8> {
    let mut html = String::from("<html><body><p>You have received files</p>");
    for link in links {
        html.push_str(&format!(
            "<span class=\"download_link_link\">{link}</span>\
             <a class=\"download_link_link\" href=\"{link}\">Get your files</a>"
        ));
    }
    html.push_str("</body></html>");

    format!(
        "From: WeTransfer <noreply@wetransfer.com>\r\n\
         Subject: You have received files\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
         \r\n\
         --b1\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         \r\n\
         You have received files\r\n\
         --b1\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         \r\n\
         {html}\r\n\
         --b1--\r\n"
    )
    .into_bytes()
}

/// Zip archive bytes holding `entries`
pub(crate) fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
