//! Log output setup.
//!
//! Installs a `tracing_subscriber` fmt layer behind an `EnvFilter`. `RUST_LOG`
//! takes precedence over the configured level.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging. Calling it again after a subscriber is installed is a
/// no-op.
pub fn init(log_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)
            .with_context(|| format!("Invalid log level: {log_level}"))?,
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(log_level, "logging initialized");
    }
    Ok(())
}
