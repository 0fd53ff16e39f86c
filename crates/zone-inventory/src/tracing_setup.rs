//! Tracing subscriber setup
//!
//! Logs go to stderr so stdout carries only inventory JSON or the
//! one-line run summary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` if set, otherwise `default_level`, or
/// `debug` when verbose
pub fn env_filter(default_level: &str, verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { default_level };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global subscriber
///
/// Must be called once at startup before any tracing macros are used.
/// A second call (e.g. from tests sharing a process) is ignored.
pub fn init(default_level: &str, verbose: bool) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter(default_level, verbose))
        .with(fmt_layer)
        .try_init();
}
