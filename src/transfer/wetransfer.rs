use super::{ResolvedTransfer, TransferBackend};
use crate::error::{DownloadError, Error, Result};
use crate::utils::safe_file_name;
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

/// Public WeTransfer site, also hosting the download API
const DEFAULT_BASE_URL: &str = "https://wetransfer.com/";

const USER_AGENT: &str = concat!("mailfetch/", env!("CARGO_PKG_VERSION"));

/// Identifiers carried by a `/downloads/...` share link
#[derive(Debug, Clone, PartialEq, Eq)]
struct ShareLink {
    transfer_id: String,
    recipient_id: Option<String>,
    security_hash: String,
}

#[derive(Serialize)]
struct DirectLinkRequest<'a> {
    intent: &'static str,
    security_hash: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    recipient_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct DirectLinkResponse {
    direct_link: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// WeTransfer link resolution and download over HTTPS
///
/// Resolution mirrors what the WeTransfer web page does: open a session on
/// the site to obtain a CSRF token and cookies, then ask the transfer API
/// for a direct link to the whole transfer.
pub struct WeTransferClient {
    http: reqwest::Client,
    base_url: Url,
}

impl WeTransferClient {
    /// Client talking to the public WeTransfer site
    pub fn new() -> Result<Self> {
        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|e| Error::Other(format!("invalid WeTransfer base URL: {e}")))?;
        Self::with_base_url(base_url)
    }

    /// Client talking to another host (a mirror or a test server)
    pub fn with_base_url(base_url: Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, base_url })
    }

    /// Open a session on the site and return its CSRF token, if it has one
    async fn csrf_token(&self) -> Result<Option<String>> {
        let response = self.http.get(self.base_url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(DownloadError::HttpStatus {
                url: self.base_url.to_string(),
                status: response.status().as_u16(),
            }
            .into());
        }
        let page = response.text().await?;
        Ok(csrf_from_page(&page))
    }

    async fn direct_link(&self, link: &str, share: &ShareLink) -> Result<Url> {
        let endpoint = self
            .base_url
            .join(&format!("api/v4/transfers/{}/download", share.transfer_id))
            .map_err(|e| resolution_error(link, format!("bad API URL: {e}")))?;

        let token = self.csrf_token().await?;
        let mut request = self
            .http
            .post(endpoint)
            .header("x-requested-with", "XMLHttpRequest")
            .json(&DirectLinkRequest {
                intent: "entire_transfer",
                security_hash: &share.security_hash,
                recipient_id: share.recipient_id.as_deref(),
            });
        match token {
            Some(token) => request = request.header("x-csrf-token", token),
            None => warn!("no CSRF token on WeTransfer page, trying without"),
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(resolution_error(
                link,
                format!("transfer API answered {}", response.status()),
            ));
        }

        let body: DirectLinkResponse = response.json().await?;
        let direct = body.direct_link.ok_or_else(|| {
            resolution_error(
                link,
                body.message
                    .unwrap_or_else(|| "no direct_link in API response".to_string()),
            )
        })?;
        Url::parse(&direct).map_err(|e| resolution_error(link, format!("bad direct link: {e}")))
    }
}

#[async_trait]
impl TransferBackend for WeTransferClient {
    async fn resolve(&self, link: &str) -> Result<ResolvedTransfer> {
        let share = parse_share_link(link).ok_or_else(|| {
            Error::Download(DownloadError::UnrecognizedLink {
                link: link.to_string(),
            })
        })?;

        let direct_url = self.direct_link(link, &share).await?;
        let file_name = safe_file_name(&direct_url);
        debug!(%link, %direct_url, %file_name, "resolved transfer link");

        Ok(ResolvedTransfer {
            link: link.to_string(),
            direct_url,
            file_name,
        })
    }

    async fn download(&self, transfer: &ResolvedTransfer, outdir: &Path) -> Result<String> {
        let response = self.http.get(transfer.direct_url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(DownloadError::HttpStatus {
                url: transfer.direct_url.to_string(),
                status: response.status().as_u16(),
            }
            .into());
        }

        let target = outdir.join(&transfer.file_name);
        let partial = outdir.join(format!("{}.part", transfer.file_name));

        if let Err(e) = write_body(response, &partial).await {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                debug!(?partial, error = %cleanup, "could not remove partial download");
            }
            return Err(e);
        }
        tokio::fs::rename(&partial, &target).await?;

        Ok(transfer.file_name.clone())
    }

    fn name(&self) -> &'static str {
        "wetransfer"
    }
}

async fn write_body(mut response: reqwest::Response, path: &Path) -> Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

/// Split `/downloads/<transfer>[/<recipient>]/<hash>` into its parts
fn parse_share_link(link: &str) -> Option<ShareLink> {
    let url = Url::parse(link).ok()?;
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    segments.find(|s| *s == "downloads")?;
    let params: Vec<&str> = segments.collect();

    match params.as_slice() {
        [transfer_id, security_hash] => Some(ShareLink {
            transfer_id: transfer_id.to_string(),
            recipient_id: None,
            security_hash: security_hash.to_string(),
        }),
        [transfer_id, recipient_id, security_hash] => Some(ShareLink {
            transfer_id: transfer_id.to_string(),
            recipient_id: Some(recipient_id.to_string()),
            security_hash: security_hash.to_string(),
        }),
        _ => None,
    }
}

fn csrf_from_page(page: &str) -> Option<String> {
    let document = Html::parse_document(page);
    let selector = Selector::parse("meta[name=\"csrf-token\"]").ok()?;
    document
        .select(&selector)
        .find_map(|meta| meta.value().attr("content"))
        .map(str::to_string)
}

fn resolution_error(link: &str, reason: impl Into<String>) -> Error {
    Error::Download(DownloadError::Resolution {
        link: link.to_string(),
        reason: reason.into(),
    })
}
