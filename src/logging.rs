//! Log output setup for the command-line front end

use crate::error::{Error, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::ChronoLocal;

/// Timestamp prefix on every log line
pub const TIMESTAMP_FORMAT: &str = "[%Y-%m-%d %H:%M:%S]";

/// Install the global subscriber
///
/// `RUST_LOG` wins when set; otherwise this crate logs at `info`, or `debug`
/// with levels printed when `verbose` is set.
pub fn init(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_target(false)
        .with_level(verbose)
        .try_init()
        .map_err(|e| Error::Other(format!("failed to install logger: {e}")))
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "mailfetch=debug"
    } else {
        "mailfetch=info"
    }
}
