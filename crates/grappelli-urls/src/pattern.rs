//! Path pattern compiler.
//!
//! A pattern is a `/`-separated list of segments:
//!
//! - `users`: a literal, compared for exact equality
//! - `{id}` / `{id:int}`: a named parameter with an optional type constraint
//!   (see [`Converter`])
//! - `{rest:*}` / `{rest:path}`: a wildcard taking the remainder of the path;
//!   only allowed as the last segment
//!
//! Braces must enclose a whole segment: `v{version}` is rejected.
//!
//! Matching works on segments, so empty segments in a path are ignored:
//! `/users/`, `/users` and `//users` are the same path. Segments are
//! percent-decoded before they are compared or converted.

use crate::converters::Converter;
use grappelli_core::exception::{Error, Result};
use grappelli_http::{ParamValue, PathParams};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Maximum allowed length for a pattern string in bytes.
pub const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of segments in a pattern.
pub const MAX_PATH_SEGMENTS: usize = 32;

/// Characters escaped when a value is written into a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
	.add(b' ')
	.add(b'"')
	.add(b'#')
	.add(b'%')
	.add(b'/')
	.add(b'<')
	.add(b'>')
	.add(b'?')
	.add(b'`')
	.add(b'{')
	.add(b'}');

/// One compiled segment of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	Literal(String),
	Param { name: String, converter: Converter },
}

impl Segment {
	fn param_name(&self) -> Option<&str> {
		match self {
			Segment::Param { name, .. } => Some(name),
			Segment::Literal(_) => None,
		}
	}
}

/// A compiled path pattern.
///
/// # Examples
///
/// ```
/// use grappelli_urls::PathPattern;
///
/// let pattern = PathPattern::new("/users/{id:int}/").unwrap();
/// let params = pattern.match_path("/users/42/").unwrap();
/// assert_eq!(params.get_int("id"), Some(42));
/// assert!(pattern.match_path("/users/abc/").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
	raw: String,
	segments: Vec<Segment>,
	trailing_slash: bool,
}

impl PathPattern {
	/// Compiles a pattern.
	///
	/// # Errors
	///
	/// Returns [`Error::PatternSyntax`] if the pattern is empty or too long,
	/// has too many segments, misplaces braces, uses an unknown type
	/// constraint, repeats a parameter name, or has a wildcard that is not
	/// the last segment.
	pub fn new(pattern: &str) -> Result<Self> {
		if pattern.is_empty() {
			return Err(Error::pattern(pattern, "pattern is empty"));
		}
		if pattern.len() > MAX_PATTERN_LENGTH {
			return Err(Error::pattern(
				pattern,
				format!(
					"pattern length {} exceeds maximum allowed length of {} bytes",
					pattern.len(),
					MAX_PATTERN_LENGTH
				),
			));
		}

		let raw_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
		if raw_segments.len() > MAX_PATH_SEGMENTS {
			return Err(Error::pattern(
				pattern,
				format!(
					"pattern has {} segments, exceeding maximum of {}",
					raw_segments.len(),
					MAX_PATH_SEGMENTS
				),
			));
		}

		let mut segments = Vec::with_capacity(raw_segments.len());
		let mut seen = HashSet::new();
		for (index, raw) in raw_segments.iter().enumerate() {
			let segment = parse_segment(pattern, raw)?;
			if let Segment::Param { name, converter } = &segment {
				if !seen.insert(name.clone()) {
					return Err(Error::pattern(
						pattern,
						format!("duplicate parameter name '{}'", name),
					));
				}
				if converter.is_wildcard() && index + 1 != raw_segments.len() {
					return Err(Error::pattern(
						pattern,
						format!("wildcard '{}' must be the last segment", name),
					));
				}
			}
			segments.push(segment);
		}

		Ok(Self {
			raw: pattern.to_string(),
			trailing_slash: pattern.len() > 1 && pattern.ends_with('/'),
			segments,
		})
	}

	/// The pattern as written.
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	/// Parameter names in pattern order.
	pub fn param_names(&self) -> impl Iterator<Item = &str> {
		self.segments.iter().filter_map(Segment::param_name)
	}

	pub fn has_wildcard(&self) -> bool {
		matches!(
			self.segments.last(),
			Some(Segment::Param { converter, .. }) if converter.is_wildcard()
		)
	}

	pub fn has_trailing_slash(&self) -> bool {
		self.trailing_slash
	}

	/// Whether the pattern has no parameters.
	pub fn is_static(&self) -> bool {
		self.param_names().next().is_none()
	}

	/// Matches a whole path. A segment that is not valid UTF-8 once decoded
	/// never matches.
	pub fn match_path(&self, path: &str) -> Option<PathParams> {
		self.match_segments(&split_path(path)?)
	}

	/// Matches the leading segments of `path`, returning the parameters and
	/// the unmatched remainder (always starting with `/`).
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_urls::PathPattern;
	///
	/// let prefix = PathPattern::new("/tenants/{tenant:slug}/").unwrap();
	/// let (params, rest) = prefix.match_prefix("/tenants/acme/users/7").unwrap();
	/// assert_eq!(params.get_str("tenant"), Some("acme"));
	/// assert_eq!(rest, "/users/7");
	/// ```
	pub fn match_prefix(&self, path: &str) -> Option<(PathParams, String)> {
		let segments = split_path(path)?;
		let (params, consumed) = self.match_leading(&segments)?;
		let rest = segments[consumed..]
			.iter()
			.map(|s| encode_segment(s))
			.collect::<Vec<_>>();
		Some((params, format!("/{}", rest.join("/"))))
	}

	pub(crate) fn match_segments(&self, segments: &[String]) -> Option<PathParams> {
		let (params, consumed) = self.match_leading(segments)?;
		(consumed == segments.len()).then_some(params)
	}

	/// Matches as many leading `segments` as the pattern describes.
	/// Returns the parameters and the number of segments consumed.
	pub(crate) fn match_leading(&self, segments: &[String]) -> Option<(PathParams, usize)> {
		let mut params = PathParams::new();
		for (index, segment) in self.segments.iter().enumerate() {
			match segment {
				Segment::Literal(literal) => {
					if segments.get(index)? != literal {
						return None;
					}
				}
				Segment::Param { name, converter } if converter.is_wildcard() => {
					let rest = segments.get(index..).unwrap_or_default().join("/");
					params.insert(name.clone(), ParamValue::Path(rest));
					return Some((params, segments.len()));
				}
				Segment::Param { name, converter } => {
					let value = converter.to_value(segments.get(index)?)?;
					params.insert(name.clone(), value);
				}
			}
		}
		Some((params, self.segments.len()))
	}

	/// Writes this pattern's segments for reverse lookup, encoded.
	///
	/// Every parameter consumed from `params` is recorded in `used`.
	pub(crate) fn render(
		&self,
		params: &HashMap<String, String>,
		used: &mut HashSet<String>,
		out: &mut Vec<String>,
	) -> Result<()> {
		for segment in &self.segments {
			match segment {
				Segment::Literal(literal) => out.push(encode_segment(literal)),
				Segment::Param { name, converter } => {
					let value = params.get(name).ok_or_else(|| {
						Error::ReverseLookup(format!(
							"missing parameter '{}' for pattern '{}'",
							name, self.raw
						))
					})?;
					let canonical = converter.to_url(value).ok_or_else(|| {
						Error::ReverseLookup(format!(
							"value '{}' is not a valid {} for parameter '{}'",
							value,
							converter.name(),
							name
						))
					})?;
					used.insert(name.clone());
					if converter.is_wildcard() {
						out.extend(
							canonical
								.split('/')
								.filter(|s| !s.is_empty())
								.map(encode_segment),
						);
					} else {
						out.push(encode_segment(&canonical));
					}
				}
			}
		}
		Ok(())
	}

	/// Builds a URL for this pattern alone.
	///
	/// # Errors
	///
	/// Returns [`Error::ReverseLookup`] when a parameter is missing, does not
	/// satisfy its type constraint, or is not part of the pattern.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_urls::PathPattern;
	/// use std::collections::HashMap;
	///
	/// let pattern = PathPattern::new("/posts/{slug:slug}/").unwrap();
	/// let params = HashMap::from([("slug".to_string(), "hello-world".to_string())]);
	/// assert_eq!(pattern.reverse(&params).unwrap(), "/posts/hello-world/");
	/// ```
	pub fn reverse(&self, params: &HashMap<String, String>) -> Result<String> {
		let mut used = HashSet::new();
		let mut segments = Vec::new();
		self.render(params, &mut used, &mut segments)?;
		reject_unused(params, &used)?;
		Ok(join_url(&segments, self.trailing_slash))
	}
}

impl fmt::Display for PathPattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.raw)
	}
}

fn parse_segment(pattern: &str, raw: &str) -> Result<Segment> {
	let has_braces = raw.contains('{') || raw.contains('}');
	if !has_braces {
		let literal = decode_segment(raw).ok_or_else(|| {
			Error::pattern(pattern, format!("segment '{}' is not valid UTF-8 once decoded", raw))
		})?;
		return Ok(Segment::Literal(literal));
	}

	let inner = raw
		.strip_prefix('{')
		.and_then(|s| s.strip_suffix('}'))
		.filter(|s| !s.contains('{') && !s.contains('}'))
		.ok_or_else(|| {
			Error::pattern(
				pattern,
				format!("segment '{}' must be a single '{{name}}' or '{{name:type}}'", raw),
			)
		})?;

	let (name, type_name) = inner.split_once(':').unwrap_or((inner, ""));
	if name.is_empty() {
		return Err(Error::pattern(pattern, "parameter name is empty"));
	}
	if !is_identifier(name) {
		return Err(Error::pattern(
			pattern,
			format!("parameter name '{}' is not a valid identifier", name),
		));
	}
	let converter = Converter::from_name(type_name).ok_or_else(|| {
		Error::pattern(
			pattern,
			format!("unknown type '{}' for parameter '{}'", type_name, name),
		)
	})?;

	Ok(Segment::Param {
		name: name.to_string(),
		converter,
	})
}

fn is_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits a raw path into decoded, non-empty segments, or `None` when a
/// segment does not decode to valid UTF-8.
pub fn split_path(path: &str) -> Option<Vec<String>> {
	path.split('/')
		.filter(|s| !s.is_empty())
		.map(decode_segment)
		.collect()
}

fn decode_segment(raw: &str) -> Option<String> {
	percent_decode_str(raw)
		.decode_utf8()
		.ok()
		.map(|decoded| decoded.into_owned())
}

pub(crate) fn encode_segment(segment: &str) -> String {
	utf8_percent_encode(segment, SEGMENT).to_string()
}

pub(crate) fn join_url(segments: &[String], trailing_slash: bool) -> String {
	if segments.is_empty() {
		return "/".to_string();
	}
	let mut url = format!("/{}", segments.join("/"));
	if trailing_slash {
		url.push('/');
	}
	url
}

pub(crate) fn reject_unused(params: &HashMap<String, String>, used: &HashSet<String>) -> Result<()> {
	let mut unused: Vec<&str> = params
		.keys()
		.filter(|key| !used.contains(*key))
		.map(String::as_str)
		.collect();
	if unused.is_empty() {
		return Ok(());
	}
	unused.sort_unstable();
	Err(Error::ReverseLookup(format!(
		"unexpected parameters: {}",
		unused.join(", ")
	)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn reason(result: Result<PathPattern>) -> String {
		match result {
			Err(Error::PatternSyntax { reason, .. }) => reason,
			other => panic!("expected a pattern error, got {:?}", other),
		}
	}

	#[rstest]
	fn test_compiles_segments() {
		let pattern = PathPattern::new("/users/{id:int}/posts/{slug:slug}/").unwrap();
		assert_eq!(
			pattern.segments(),
			&[
				Segment::Literal("users".to_string()),
				Segment::Param {
					name: "id".to_string(),
					converter: Converter::Int
				},
				Segment::Literal("posts".to_string()),
				Segment::Param {
					name: "slug".to_string(),
					converter: Converter::Slug
				},
			]
		);
		assert!(pattern.has_trailing_slash());
		assert_eq!(pattern.param_names().collect::<Vec<_>>(), vec!["id", "slug"]);
	}

	#[rstest]
	#[case("", "pattern is empty")]
	#[case("/a/{id}/{id}", "duplicate parameter name 'id'")]
	#[case("/{rest:*}/tail", "wildcard 'rest' must be the last segment")]
	#[case("/{id:float}", "unknown type 'float' for parameter 'id'")]
	#[case("/{}", "parameter name is empty")]
	#[case("/{:int}", "parameter name is empty")]
	#[case("/{1st}", "parameter name '1st' is not a valid identifier")]
	fn test_rejects_invalid_patterns(#[case] raw: &str, #[case] expected: &str) {
		assert_eq!(reason(PathPattern::new(raw)), expected);
	}

	#[rstest]
	#[case("/v{version}")]
	#[case("/{id")]
	#[case("/id}")]
	#[case("/{{id}}")]
	fn test_rejects_braces_not_enclosing_a_segment(#[case] raw: &str) {
		assert!(reason(PathPattern::new(raw)).contains("must be a single"));
	}

	#[rstest]
	fn test_rejects_oversized_patterns() {
		let long = format!("/{}", "a".repeat(MAX_PATTERN_LENGTH));
		assert!(reason(PathPattern::new(&long)).contains("exceeds maximum allowed length"));

		let deep = "/a".repeat(MAX_PATH_SEGMENTS + 1);
		assert!(reason(PathPattern::new(&deep)).contains("exceeding maximum"));
	}

	#[rstest]
	#[case("/users/42", Some(42))]
	#[case("/users/42/", Some(42))]
	#[case("/users/abc", None)]
	#[case("/users", None)]
	#[case("/users/42/extra", None)]
	fn test_typed_match(#[case] path: &str, #[case] expected: Option<i64>) {
		let pattern = PathPattern::new("/users/{id:int}").unwrap();
		assert_eq!(
			pattern.match_path(path).and_then(|p| p.get_int("id")),
			expected
		);
	}

	#[rstest]
	fn test_root_pattern_matches_only_root() {
		let pattern = PathPattern::new("/").unwrap();
		assert!(pattern.match_path("/").is_some());
		assert!(pattern.match_path("").is_some());
		assert!(pattern.match_path("/x").is_none());
		assert!(!pattern.has_trailing_slash());
	}

	#[rstest]
	#[case("/static/css/site.css", "css/site.css")]
	#[case("/static/", "")]
	#[case("/static/a//b", "a/b")]
	fn test_wildcard_captures_remainder(#[case] path: &str, #[case] expected: &str) {
		let pattern = PathPattern::new("/static/{file:*}").unwrap();
		let params = pattern.match_path(path).unwrap();
		assert_eq!(params.get("file"), Some(&ParamValue::Path(expected.to_string())));
	}

	#[rstest]
	fn test_undecodable_segment_does_not_match() {
		let pattern = PathPattern::new("/files/{name}").unwrap();
		assert!(pattern.match_path("/files/%FF").is_none());
		assert!(pattern.match_path("/files/ok%C3").is_none());

		let prefix = PathPattern::new("/files/").unwrap();
		assert!(prefix.match_prefix("/files/%FF/raw").is_none());
		assert!(PathPattern::new("/files/%FF").is_err());
	}

	#[rstest]
	fn test_segments_are_percent_decoded() {
		let pattern = PathPattern::new("/files/{name}").unwrap();
		let params = pattern.match_path("/files/annual%20report").unwrap();
		assert_eq!(params.get_str("name"), Some("annual report"));
	}

	#[rstest]
	fn test_match_prefix_returns_encoded_remainder() {
		let pattern = PathPattern::new("/app1/").unwrap();
		let (params, rest) = pattern.match_prefix("/app1/a%20b/c").unwrap();
		assert!(params.is_empty());
		assert_eq!(rest, "/a%20b/c");
		assert!(pattern.match_prefix("/app2/users").is_none());
	}

	#[rstest]
	fn test_reverse_encodes_values() {
		let pattern = PathPattern::new("/files/{name}").unwrap();
		let params = HashMap::from([("name".to_string(), "a b/c".to_string())]);
		let url = pattern.reverse(&params).unwrap();
		assert_eq!(url, "/files/a%20b%2Fc");
		assert_eq!(
			pattern.match_path(&url).unwrap().get_str("name"),
			Some("a b/c")
		);
	}

	#[rstest]
	fn test_reverse_wildcard_keeps_separators() {
		let pattern = PathPattern::new("/static/{file:path}").unwrap();
		let params = HashMap::from([("file".to_string(), "css/site.css".to_string())]);
		assert_eq!(pattern.reverse(&params).unwrap(), "/static/css/site.css");
	}

	#[rstest]
	#[case(&[], "missing parameter 'id'")]
	#[case(&[("id", "x")], "is not a valid int")]
	#[case(&[("id", "1"), ("extra", "2")], "unexpected parameters: extra")]
	fn test_reverse_errors(#[case] given: &[(&str, &str)], #[case] expected: &str) {
		let pattern = PathPattern::new("/users/{id:int}").unwrap();
		let params: HashMap<String, String> = given
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		match pattern.reverse(&params) {
			Err(Error::ReverseLookup(message)) => assert!(
				message.contains(expected),
				"'{}' does not contain '{}'",
				message,
				expected
			),
			other => panic!("expected reverse error, got {:?}", other),
		}
	}
}
