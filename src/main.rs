use clap::Parser;
use mailfetch::{Config, ConfigOverrides, FetchSession, fetch_with_shutdown, logging};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

/// Download files announced by WeTransfer notification emails
#[derive(Debug, Parser)]
#[command(name = "mailfetch", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// IMAP server host name
    #[arg(long)]
    server: Option<String>,

    /// IMAP server port (implicit TLS)
    #[arg(long)]
    port: Option<u16>,

    /// Login user name
    #[arg(short, long)]
    user: Option<String>,

    /// Login password
    #[arg(long, env = "MAILFETCH_PASS", hide_env_values = true)]
    pass: Option<String>,

    /// Mailbox to read
    #[arg(long)]
    mailbox: Option<String>,

    /// Directory downloads are written to
    #[arg(short, long, value_name = "DIR")]
    outdir: Option<PathBuf>,

    /// Leave downloaded archives packed
    #[arg(long)]
    no_unzip: bool,

    /// Remove archives after extracting them
    #[arg(long)]
    delete_archives: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            server: self.server.clone(),
            port: self.port,
            username: self.user.clone(),
            password: self.pass.clone(),
            mailbox: self.mailbox.clone(),
            autostart: None,
            unzip: self.no_unzip.then_some(false),
            keep_archive: self.delete_archives.then_some(false),
            outdir: self.outdir.clone(),
        }
    }

    fn load_config(&self) -> mailfetch::Result<Config> {
        let base = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        let config = base.overlay(self.overrides());
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{e}");
    }

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut session = match FetchSession::new(config) {
        Ok(session) => session,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if !session.connect().await {
        return ExitCode::FAILURE;
    }

    match fetch_with_shutdown(&mut session).await {
        Some(_) => ExitCode::SUCCESS,
        None => ExitCode::from(130),
    }
}
