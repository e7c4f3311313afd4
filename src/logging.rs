//! Logging and tracing configuration

use crate::config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing based on configuration
///
/// `RUST_LOG` takes precedence over the configured level. Supported formats are
/// `json`, `pretty` and `compact`; anything else falls back to the default
/// human-readable layer.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => registry
            .with(fmt::layer().with_target(false).json())
            .try_init()?,
        "pretty" => registry.with(fmt::layer().pretty()).try_init()?,
        "compact" => registry.with(fmt::layer().compact()).try_init()?,
        _ => registry.with(fmt::layer()).try_init()?,
    }

    Ok(())
}
