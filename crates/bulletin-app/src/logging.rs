//! Log subscriber installation.
//!
//! Library code only emits `tracing` events. Binaries and integration
//! harnesses call [`init_tracing`] once at startup.

use crate::config::BulletinConfig;
use crate::errors::ConfigError;
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber filtered by `config.log_filter`.
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_tracing(config: &BulletinConfig) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .map_err(|e| ConfigError::Logging(format!("invalid filter '{}': {e}", config.log_filter)))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))
}
