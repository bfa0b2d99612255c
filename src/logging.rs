//! Logging setup.
//!
//! ANSI-colored output via `tracing-subscriber`, with noisy HTTP-stack
//! modules filtered to `warn` unless `RUST_LOG` overrides the filter.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Modules whose debug/trace output is connection-pool and TLS chatter
/// rather than anything about the bot itself.
pub const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls", "tokio_util"];

/// Build the default `EnvFilter` with noise suppression.
fn build_filter(log_level: &str) -> EnvFilter {
    // RUST_LOG wins if set
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let mut directives = String::from(log_level);
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{module}=warn"));
    }

    EnvFilter::new(&directives)
}

/// Initialize logging at the given base level (trace, debug, info, warn, error).
pub fn init_logging(log_level: &str) {
    let filter = build_filter(log_level);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(true)
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
