//! Tracing setup for embedders that have no subscriber of their own.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "siteprobe_runtime=info";

/// Install a global fmt subscriber.
///
/// Honors `RUST_LOG`; `RUST_LOG_FORMAT=json` switches to JSON lines.
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let result = if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .try_init()
    };
    result.is_ok()
}
