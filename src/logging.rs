//! Logging initialization for the binaries.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter, e.g. `LOG_LEVEL=debug`
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Install a stderr subscriber filtered by `LOG_LEVEL` (default `info`).
///
/// Calling it twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var(LOG_LEVEL_ENV)
                .from_env_lossy(),
        )
        .try_init();
}
