//! Diagnostics go to stderr so stdout stays clean for table or JSON output.

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// Builds the event filter: `directives` (usually `RUST_LOG`) on top of a
/// default level. Malformed directives are skipped.
pub fn build_filter(default_level: LevelFilter, directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .parse_lossy(directives)
}

/// Installs the global subscriber. `verbose` lowers the default level to DEBUG.
pub fn init(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();

    let fmt_layer = layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_filter(build_filter(default_level, &directives));

    registry().with(fmt_layer).init();
}
