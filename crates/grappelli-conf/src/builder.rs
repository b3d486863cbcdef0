//! Merging of configuration sources.

use crate::sources::{ConfigSource, SourceError};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Collects [`ConfigSource`]s and merges them by priority.
///
/// # Examples
///
/// ```
/// use grappelli_conf::builder::SettingsBuilder;
/// use grappelli_conf::sources::DefaultSource;
/// use serde_json::json;
///
/// let merged = SettingsBuilder::new()
///     .add_source(DefaultSource::new().with_value("debug", json!(false)))
///     .build()
///     .unwrap();
/// assert_eq!(merged.get::<bool>("debug").unwrap(), false);
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Loads every source and merges them; for equal priorities the source
	/// added last wins.
	pub fn build(mut self) -> Result<MergedSettings, SourceError> {
		self.sources.sort_by_key(|source| source.priority());

		let mut values = IndexMap::new();
		for source in &self.sources {
			let loaded = source.load()?;
			tracing::debug!(
				source = %source.description(),
				keys = loaded.len(),
				"configuration source loaded"
			);
			values.extend(loaded);
		}

		Ok(MergedSettings { values })
	}
}

/// The merged key/value view of all sources.
#[derive(Debug, Clone, Default)]
pub struct MergedSettings {
	values: IndexMap<String, Value>,
}

impl MergedSettings {
	/// Reads one key as `T`.
	pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, SourceError> {
		let value = self
			.values
			.get(key)
			.ok_or_else(|| SourceError::Parse(format!("missing key '{}'", key)))?;
		Ok(serde_json::from_value(value.clone())?)
	}

	pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
		self.get(key).unwrap_or(default)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	pub fn values(&self) -> &IndexMap<String, Value> {
		&self.values
	}

	/// Deserializes every key into `T`. Unknown keys are ignored.
	pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, SourceError> {
		let object: serde_json::Map<String, Value> = self.values.into_iter().collect();
		Ok(serde_json::from_value(Value::Object(object))?)
	}
}
