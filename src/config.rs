//! Configuration types for mailfetch
//!
//! A [`Config`] is a plain value: it is built once from fresh defaults, with
//! caller-supplied keys laid on top, and never mutated afterwards. Two ways
//! of supplying keys are supported and can be combined:
//!
//! * a TOML (or any serde format) mapping, where absent keys keep their
//!   defaults and unknown keys are ignored;
//! * a [`ConfigOverrides`] value, typically built from command line flags,
//!   applied with [`Config::overlay`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default IMAPS port
pub const DEFAULT_IMAPS_PORT: u16 = 993;

/// Session configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// IMAP server host name (required to connect)
    #[serde(default)]
    pub server: Option<String>,

    /// IMAP server port, implicit TLS (default: 993)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Login user name (required to connect)
    #[serde(default, rename = "user", alias = "username")]
    pub username: Option<String>,

    /// Login password (required to connect)
    #[serde(default, rename = "pass", alias = "password")]
    pub password: Option<String>,

    /// Mailbox to scan for unread messages (default: "inbox")
    #[serde(default = "default_mailbox")]
    pub mailbox: String,

    /// Run a fetch right after a successful connect
    #[serde(default)]
    pub autostart: bool,

    /// Extract zip archives after download (default: true)
    #[serde(default = "default_true")]
    pub unzip: bool,

    /// Keep the archive after a successful extraction (default: true)
    #[serde(default = "default_true")]
    pub keep_archive: bool,

    /// Directory receiving downloads and extracted files
    /// (default: `<temp dir>/zipfiles`)
    #[serde(default = "default_outdir")]
    pub outdir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: None,
            port: default_port(),
            username: None,
            password: None,
            mailbox: default_mailbox(),
            autostart: false,
            unzip: true,
            keep_archive: true,
            outdir: default_outdir(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("mailbox", &self.mailbox)
            .field("autostart", &self.autostart)
            .field("unzip", &self.unzip)
            .field("keep_archive", &self.keep_archive)
            .field("outdir", &self.outdir)
            .finish()
    }
}

impl Config {
    /// Parse a TOML document, keeping defaults for every absent key
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| Error::Config {
            message: format!("invalid configuration: {}", e.message()),
            key: None,
        })
    }

    /// Read and parse a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        Self::from_toml_str(&source)
    }

    /// Lay caller-supplied values over this configuration
    ///
    /// Fields left as `None` in `overrides` keep their current value.
    pub fn overlay(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(server) = overrides.server {
            self.server = Some(server);
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(username) = overrides.username {
            self.username = Some(username);
        }
        if let Some(password) = overrides.password {
            self.password = Some(password);
        }
        if let Some(mailbox) = overrides.mailbox {
            self.mailbox = mailbox;
        }
        if let Some(autostart) = overrides.autostart {
            self.autostart = autostart;
        }
        if let Some(unzip) = overrides.unzip {
            self.unzip = unzip;
        }
        if let Some(keep_archive) = overrides.keep_archive {
            self.keep_archive = keep_archive;
        }
        if let Some(outdir) = overrides.outdir {
            self.outdir = outdir;
        }
        self
    }

    /// Reject values no session could work with
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::config("port must be non-zero", "port"));
        }
        if self.mailbox.trim().is_empty() {
            return Err(Error::config("mailbox must not be empty", "mailbox"));
        }
        if self.outdir.exists() && !self.outdir.is_dir() {
            return Err(Error::config(
                format!("{} is not a directory", self.outdir.display()),
                "outdir",
            ));
        }
        Ok(())
    }

    /// Names of the connection keys that are not set
    ///
    /// Empty when the configuration holds everything `connect` needs.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.server.is_none() {
            missing.push("server");
        }
        if self.username.is_none() {
            missing.push("user");
        }
        if self.password.is_none() {
            missing.push("pass");
        }
        missing
    }

    /// Human-readable server name for log lines
    pub fn server_label(&self) -> &str {
        self.server.as_deref().unwrap_or("IMAP server")
    }
}

/// Optional per-field replacements for a [`Config`]
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Replacement server
    pub server: Option<String>,
    /// Replacement port
    pub port: Option<u16>,
    /// Replacement user name
    pub username: Option<String>,
    /// Replacement password
    pub password: Option<String>,
    /// Replacement mailbox
    pub mailbox: Option<String>,
    /// Replacement autostart flag
    pub autostart: Option<bool>,
    /// Replacement unzip flag
    pub unzip: Option<bool>,
    /// Replacement keep-archive flag
    pub keep_archive: Option<bool>,
    /// Replacement output directory
    pub outdir: Option<PathBuf>,
}

fn default_port() -> u16 {
    DEFAULT_IMAPS_PORT
}

fn default_mailbox() -> String {
    "inbox".to_string()
}

fn default_true() -> bool {
    true
}

fn default_outdir() -> PathBuf {
    std::env::temp_dir().join("zipfiles")
}
