//! Tracing subscriber setup for the workspace binaries.
//!
//! Library crates only emit events through `tracing`; installing a subscriber
//! is the binary's job.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` wins when present; otherwise `default_level` (e.g. `"info"`)
/// applies to every target. Calling this twice is harmless: the second
/// install attempt is ignored.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
