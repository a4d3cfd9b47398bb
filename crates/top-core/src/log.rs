//! Tracing setup for plugins loaded into a host process.

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static SUBSCRIBER: OnceCell<bool> = OnceCell::new();

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Install a `fmt` subscriber writing to stderr, once per process.
///
/// Returns `true` when this plugin's subscriber is the active one. The host
/// may have loaded another library that already set a global subscriber; in
/// that case events go to that subscriber instead.
pub fn init_default_subscriber() -> bool {
    *SUBSCRIBER.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    })
}
