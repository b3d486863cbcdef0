//! Configuration sources for layered settings
//!
//! Sources are merged in priority order: environment variables > TOML file >
//! defaults.

use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync {
	/// Load configuration from this source
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Priority of this source (higher wins)
	fn priority(&self) -> u8;

	/// Human-readable description, used in log output
	fn description(&self) -> String;
}

/// Error type for configuration sources
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Invalid source: {0}")]
	InvalidSource(String),
}

impl From<SourceError> for grappelli_core::Error {
	fn from(error: SourceError) -> Self {
		grappelli_core::Error::ImproperlyConfigured(error.to_string())
	}
}

/// Environment variable configuration source
///
/// Keys are stripped of the prefix and lowercased, so `GRAPPELLI_DEBUG`
/// becomes `debug`.
pub struct EnvSource {
	prefix: Option<String>,
}

impl EnvSource {
	/// Create a source reading every environment variable
	pub fn new() -> Self {
		Self { prefix: None }
	}

	/// Only read variables starting with `prefix`
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_conf::sources::{ConfigSource, EnvSource};
	///
	/// let source = EnvSource::new().with_prefix("GRAPPELLI_");
	/// assert_eq!(source.description(), "Environment variables (prefix: GRAPPELLI_)");
	/// ```
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		let mut config = IndexMap::new();

		for (key, value) in std::env::vars() {
			let clean_key = match &self.prefix {
				Some(prefix) => match key.strip_prefix(prefix.as_str()) {
					Some(rest) => rest,
					None => continue,
				},
				None => key.as_str(),
			};
			let lower_key = clean_key.to_lowercase();
			let parsed = parse_env_value(&lower_key, value)?;
			config.insert(lower_key, parsed);
		}

		Ok(config)
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		match &self.prefix {
			Some(prefix) => format!("Environment variables (prefix: {})", prefix),
			None => "Environment variables".to_string(),
		}
	}
}

fn parse_env_value(key: &str, value: String) -> Result<Value, SourceError> {
	if key == "debug" {
		return Ok(match value.trim().to_lowercase().as_str() {
			"true" | "1" | "yes" | "on" => Value::Bool(true),
			"false" | "0" | "no" | "off" => Value::Bool(false),
			_ => Value::String(value),
		});
	}
	// Structured values (such as the middleware list) are given as JSON
	let trimmed = value.trim_start();
	if trimmed.starts_with('[') || trimmed.starts_with('{') {
		return serde_json::from_str(&value).map_err(|e| {
			SourceError::Parse(format!("environment value for '{}': {}", key, e))
		});
	}
	if let Ok(num) = value.parse::<i64>() {
		return Ok(Value::Number(num.into()));
	}
	if let Ok(b) = value.parse::<bool>() {
		return Ok(Value::Bool(b));
	}
	Ok(Value::String(value))
}

/// TOML file configuration source
///
/// A missing file yields no values.
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let toml_value: toml::Value = toml::from_str(&content)?;
		let json_value = serde_json::to_value(toml_value)?;

		match json_value {
			Value::Object(map) => Ok(map.into_iter().collect()),
			_ => Err(SourceError::Parse(format!(
				"{}: expected a table at the root",
				self.path.display()
			))),
		}
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Default values configuration source
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	pub fn new() -> Self {
		Self {
			values: IndexMap::new(),
		}
	}

	/// Add a default value for a key
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_conf::sources::{ConfigSource, DefaultSource};
	/// use serde_json::json;
	///
	/// let source = DefaultSource::new().with_value("request_timeout_ms", json!(5000));
	/// assert_eq!(source.load().unwrap()["request_timeout_ms"], json!(5000));
	/// ```
	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}
}

impl Default for DefaultSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}
