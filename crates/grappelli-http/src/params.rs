//! Typed path parameters.
//!
//! Route patterns coerce captured segments through their type constraint, so
//! a `{id:int}` segment arrives at the handler as [`ParamValue::Int`] rather
//! than as a string.

use grappelli_core::exception::{Error, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A single coerced path parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
	/// Produced by the `int` converter.
	Int(i64),
	/// Produced by the `str`, `slug` and unconstrained converters.
	Str(String),
	/// Produced by the `uuid` converter.
	Uuid(Uuid),
	/// Produced by a wildcard; may contain `/`.
	Path(String),
}

impl ParamValue {
	/// Returns the integer value, if this is an `int` parameter.
	pub fn as_int(&self) -> Option<i64> {
		match self {
			ParamValue::Int(value) => Some(*value),
			_ => None,
		}
	}

	/// Returns the textual value of string-like parameters.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			ParamValue::Str(value) | ParamValue::Path(value) => Some(value),
			_ => None,
		}
	}

	pub fn as_uuid(&self) -> Option<Uuid> {
		match self {
			ParamValue::Uuid(value) => Some(*value),
			_ => None,
		}
	}
}

impl fmt::Display for ParamValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ParamValue::Int(value) => write!(f, "{}", value),
			ParamValue::Str(value) | ParamValue::Path(value) => f.write_str(value),
			ParamValue::Uuid(value) => write!(f, "{}", value),
		}
	}
}

impl From<i64> for ParamValue {
	fn from(value: i64) -> Self {
		ParamValue::Int(value)
	}
}

impl From<&str> for ParamValue {
	fn from(value: &str) -> Self {
		ParamValue::Str(value.to_string())
	}
}

impl From<String> for ParamValue {
	fn from(value: String) -> Self {
		ParamValue::Str(value)
	}
}

impl From<Uuid> for ParamValue {
	fn from(value: Uuid) -> Self {
		ParamValue::Uuid(value)
	}
}

/// Ordered map of parameter name to coerced value.
///
/// Order follows the pattern, outermost mount first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathParams {
	values: IndexMap<String, ParamValue>,
}

impl PathParams {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a parameter, returning the previous value under that name.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Option<ParamValue> {
		self.values.insert(name.into(), value.into())
	}

	pub fn get(&self, name: &str) -> Option<&ParamValue> {
		self.values.get(name)
	}

	/// Returns an `int` parameter.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::PathParams;
	///
	/// let mut params = PathParams::new();
	/// params.insert("id", 42i64);
	/// assert_eq!(params.get_int("id"), Some(42));
	/// assert_eq!(params.get_int("missing"), None);
	/// ```
	pub fn get_int(&self, name: &str) -> Option<i64> {
		self.get(name).and_then(ParamValue::as_int)
	}

	pub fn get_str(&self, name: &str) -> Option<&str> {
		self.get(name).and_then(ParamValue::as_str)
	}

	/// Parses a parameter's textual form into `T`.
	///
	/// # Errors
	///
	/// Returns [`Error::Validation`] when the parameter is missing or does not
	/// parse.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::PathParams;
	///
	/// let mut params = PathParams::new();
	/// params.insert("page", "3");
	/// let page: u32 = params.parse("page").unwrap();
	/// assert_eq!(page, 3);
	/// ```
	pub fn parse<T>(&self, name: &str) -> Result<T>
	where
		T: FromStr,
		T::Err: fmt::Display,
	{
		let value = self
			.get(name)
			.ok_or_else(|| Error::Validation(format!("missing path parameter '{}'", name)))?;
		value
			.to_string()
			.parse::<T>()
			.map_err(|e| Error::Validation(format!("path parameter '{}': {}", name, e)))
	}

	pub fn contains(&self, name: &str) -> bool {
		self.values.contains_key(name)
	}

	/// Appends every parameter of `other`, keeping the existing order.
	pub fn merge(&mut self, other: PathParams) {
		self.values.extend(other.values);
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
		self.values.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

impl FromIterator<(String, ParamValue)> for PathParams {
	fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
		Self {
			values: iter.into_iter().collect(),
		}
	}
}

impl IntoIterator for PathParams {
	type Item = (String, ParamValue);
	type IntoIter = indexmap::map::IntoIter<String, ParamValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.values.into_iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_typed_accessors() {
		let id = Uuid::nil();
		let mut params = PathParams::new();
		params.insert("id", 42i64);
		params.insert("slug", "hello-world");
		params.insert("token", id);
		params.insert("rest", ParamValue::Path("a/b/c".to_string()));

		assert_eq!(params.get_int("id"), Some(42));
		assert_eq!(params.get_str("slug"), Some("hello-world"));
		assert_eq!(params.get("token").and_then(ParamValue::as_uuid), Some(id));
		assert_eq!(params.get_str("rest"), Some("a/b/c"));
		assert_eq!(params.get_str("id"), None);
	}

	#[rstest]
	fn test_merge_preserves_order() {
		let mut outer = PathParams::new();
		outer.insert("tenant", "acme");
		let mut inner = PathParams::new();
		inner.insert("id", 7i64);

		outer.merge(inner);

		let names: Vec<&str> = outer.iter().map(|(k, _)| k).collect();
		assert_eq!(names, vec!["tenant", "id"]);
	}

	#[rstest]
	fn test_parse_reports_missing_and_invalid() {
		let mut params = PathParams::new();
		params.insert("name", "abc");

		assert!(matches!(params.parse::<u32>("name"), Err(Error::Validation(_))));
		assert!(matches!(params.parse::<u32>("other"), Err(Error::Validation(_))));
	}

	#[rstest]
	fn test_serializes_as_plain_object() {
		let mut params = PathParams::new();
		params.insert("id", 42i64);
		params.insert("slug", "post");

		let json = serde_json::to_value(&params).unwrap();
		assert_eq!(json, serde_json::json!({"id": 42, "slug": "post"}));
	}
}
