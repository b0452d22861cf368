//! Diagnostic logging for the terminal front-end.
//!
//! Logs go to stderr so they never interleave with the rendered roster on
//! stdout. `RUST_LOG` overrides the level derived from `-v`.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

static INSTALLED: OnceLock<()> = OnceLock::new();

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "riskroster=warn",
        1 => "riskroster=info",
        _ => "riskroster=debug",
    }
}

fn build_env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
}

/// Installs the global subscriber. Subsequent calls are no-ops, and a
/// subscriber installed by someone else is left in place.
pub fn init(verbosity: u8) {
    if INSTALLED.get().is_some() {
        return;
    }
    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let subscriber = Registry::default()
        .with(build_env_filter(verbosity))
        .with(layer);
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        tracing::debug!(verbosity, "logging initialized");
    }
    let _ = INSTALLED.set(());
}
