//! Multi-valued query string parameters.

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;

/// Decoded query parameters.
///
/// Keys keep the order of their first appearance; repeated keys keep every
/// value in the order given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
	values: IndexMap<String, Vec<String>>,
}

impl QueryParams {
	/// Parses a raw query string (without the leading `?`).
	///
	/// `+` decodes to a space and percent escapes are decoded; a pair without
	/// `=` yields an empty value.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::QueryParams;
	///
	/// let query = QueryParams::parse("tag=a&tag=b&q=hello+world&flag");
	/// assert_eq!(query.get("q"), Some("hello world"));
	/// assert_eq!(query.get_all("tag"), ["a", "b"]);
	/// assert_eq!(query.get("flag"), Some(""));
	/// ```
	pub fn parse(query: &str) -> Self {
		let mut values: IndexMap<String, Vec<String>> = IndexMap::new();
		for pair in query.split('&').filter(|pair| !pair.is_empty()) {
			// Split on the first '=' only so values may contain '='
			let mut parts = pair.splitn(2, '=');
			let key = decode_component(parts.next().unwrap_or_default());
			let value = decode_component(parts.next().unwrap_or_default());
			values.entry(key).or_default().push(value);
		}
		Self { values }
	}

	/// First value for `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.values
			.get(key)
			.and_then(|values| values.first())
			.map(String::as_str)
	}

	/// Every value for `key`, empty when absent.
	pub fn get_all(&self, key: &str) -> &[String] {
		self.values.get(key).map(Vec::as_slice).unwrap_or_default()
	}

	pub fn contains(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

fn decode_component(raw: &str) -> String {
	let spaced = raw.replace('+', " ");
	percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
