// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Sets up the logging framework using tracing_subscriber.
/// Reads log level filters from the `RUST_LOG` environment variable.
/// Defaults to `default_level` if `RUST_LOG` is not set.
///
/// Log lines go to stderr so that stdout only ever carries the rendered changes.
pub fn setup_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // `try_init` so a second call (tests, embedding callers) is harmless
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    tracing::debug!("Logging setup complete.");
}
