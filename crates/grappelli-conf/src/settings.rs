//! Dispatcher settings.

use crate::builder::SettingsBuilder;
use crate::sources::{DefaultSource, EnvSource, SourceError, TomlFileSource};
use grappelli_core::exception::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Prefix of the environment variables read by [`Settings::load`].
pub const ENV_PREFIX: &str = "GRAPPELLI_";

/// Default request deadline in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Settings consumed at startup.
///
/// Immutable once loaded; the dispatcher receives them explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Exposes error details and tried routes in error responses.
	pub debug: bool,
	/// Per-request deadline; `None` disables it.
	pub request_timeout_ms: Option<u64>,
	/// `tracing-subscriber` filter directives, overridden by `RUST_LOG`.
	pub log_filter: String,
	/// Middleware in order, outermost first.
	pub middleware: Vec<MiddlewareConfig>,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			debug: false,
			request_timeout_ms: Some(DEFAULT_REQUEST_TIMEOUT_MS),
			log_filter: "info".to_string(),
			middleware: Vec::new(),
		}
	}
}

impl Settings {
	/// Loads defaults, then `path` (if it exists), then `GRAPPELLI_*`
	/// environment variables, and validates the result.
	///
	/// # Errors
	///
	/// Returns [`Error::ImproperlyConfigured`] when a source cannot be read or
	/// parsed, or when validation fails.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let defaults = Self::default();
		let merged = SettingsBuilder::new()
			.add_source(
				DefaultSource::new()
					.with_value("debug", Value::Bool(defaults.debug))
					.with_value("log_filter", Value::String(defaults.log_filter.clone())),
			)
			.add_source(TomlFileSource::new(path.as_ref()))
			.add_source(EnvSource::new().with_prefix(ENV_PREFIX))
			.build()?;
		let settings: Settings = merged.into_typed()?;
		settings.validate()?;
		Ok(settings)
	}

	/// Checks values serde cannot.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_conf::{MiddlewareConfig, Settings};
	///
	/// let mut settings = Settings::default();
	/// assert!(settings.validate().is_ok());
	///
	/// settings.middleware.push(MiddlewareConfig::new(""));
	/// assert!(settings.validate().is_err());
	/// ```
	pub fn validate(&self) -> Result<()> {
		if self.request_timeout_ms == Some(0) {
			return Err(Error::ImproperlyConfigured(
				"request_timeout_ms must be greater than zero".to_string(),
			));
		}
		if let Some(position) = self.middleware.iter().position(|m| m.path.trim().is_empty()) {
			return Err(Error::ImproperlyConfigured(format!(
				"middleware entry {} has an empty path",
				position
			)));
		}
		Ok(())
	}

	pub fn request_timeout(&self) -> Option<Duration> {
		self.request_timeout_ms.map(Duration::from_millis)
	}
}

/// Middleware configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareConfig {
	/// Identifier the middleware is registered under
	pub path: String,

	/// Middleware options
	#[serde(default)]
	pub options: HashMap<String, Value>,
}

impl MiddlewareConfig {
	/// # Examples
	///
	/// ```
	/// use grappelli_conf::MiddlewareConfig;
	///
	/// let middleware = MiddlewareConfig::new("grappelli.middleware.RequestIdMiddleware")
	///     .with_option("header_name", serde_json::json!("X-Trace-Id"));
	///
	/// assert_eq!(middleware.path, "grappelli.middleware.RequestIdMiddleware");
	/// assert_eq!(middleware.options.len(), 1);
	/// ```
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			options: HashMap::new(),
		}
	}

	pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
		self.options.insert(key.into(), value);
		self
	}

	/// Deserializes the options into a middleware's own config type.
	pub fn options_as<T: DeserializeOwned>(&self) -> std::result::Result<T, SourceError> {
		let object: serde_json::Map<String, Value> = self
			.options
			.iter()
			.map(|(key, value)| (key.clone(), value.clone()))
			.collect();
		Ok(serde_json::from_value(Value::Object(object))?)
	}
}
