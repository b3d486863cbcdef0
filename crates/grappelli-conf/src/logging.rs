//! Tracing subscriber setup.

use crate::settings::Settings;
use grappelli_core::exception::{Error, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Builds the filter: `RUST_LOG` when set, otherwise `directives`.
pub fn build_filter(directives: &str) -> Result<EnvFilter> {
	match EnvFilter::try_from_default_env() {
		Ok(filter) => Ok(filter),
		Err(_) => EnvFilter::try_new(directives).map_err(|e| {
			Error::ImproperlyConfigured(format!("invalid log filter '{}': {}", directives, e))
		}),
	}
}

/// Installs a global fmt subscriber filtered by `settings.log_filter`.
///
/// # Errors
///
/// Returns [`Error::ImproperlyConfigured`] when the filter does not parse or
/// a global subscriber is already installed.
pub fn init_logging(settings: &Settings) -> Result<()> {
	let filter = build_filter(&settings.log_filter)?;
	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_target(true))
		.try_init()
		.map_err(|e| Error::ImproperlyConfigured(format!("logging already initialized: {}", e)))?;
	tracing::debug!(filter = %settings.log_filter, debug = settings.debug, "logging initialized");
	Ok(())
}
