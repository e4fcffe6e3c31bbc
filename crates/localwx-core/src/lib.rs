pub mod config;
pub mod error;

pub use config::{
    ApiConfig, Config, DisplayConfig, IconSize, LocationConfig, TemperatureUnit, ValidationResult,
};
pub use error::{AppError, ConfigError, NetworkError, ReqwestErrorExt, WeatherError};

use anyhow::Result;

/// Initialize tracing/logging.
///
/// `RUST_LOG` takes precedence; otherwise `default_filter` (e.g. the configured
/// `log_level`) is used. Logs go to stderr so stdout stays free for the page.
pub fn init_tracing(default_filter: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::debug!("localwx tracing initialized");
    Ok(())
}

/// Run `f` with a temporary `warn` level subscriber, for work that happens
/// before the configured log level is known (loading the config itself).
pub fn with_bootstrap_tracing<T>(f: impl FnOnce() -> T) -> T {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

fn env_filter(default_filter: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter))
}
