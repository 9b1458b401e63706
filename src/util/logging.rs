//! Log output for the `univ` binary.
//!
//! Commands print their JSON summary on stdout, so diagnostics go to stderr and
//! the two streams can be redirected separately.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor `UNIV_LOG` is set.
pub const DEFAULT_FILTER: &str = "univ_migrate=info,univ=info";

/// Pick the log filter: `RUST_LOG` first, then `UNIV_LOG`, then `fallback`.
pub fn resolve_filter(rust_log: Option<&str>, univ_log: Option<&str>, fallback: &str) -> String {
    [rust_log, univ_log]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Install the global subscriber: compact lines on stderr, no targets.
pub fn init_tracing(fallback: &str) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let univ_log = std::env::var("UNIV_LOG").ok();
    let directives = resolve_filter(rust_log.as_deref(), univ_log.as_deref(), fallback);
    let filter = EnvFilter::try_new(&directives)
        .map_err(|e| anyhow!("invalid log filter {directives:?}: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to initialize tracing: {e}"))
}
