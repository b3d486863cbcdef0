//! Type constraints for path parameters.
//!
//! A converter decides whether a path segment is acceptable for a parameter,
//! coerces it into a [`ParamValue`], and checks values supplied to reverse
//! lookup before they are written back into a URL.
//!
//! | Constraint | Accepts | Value |
//! |---|---|---|
//! | *(none)*, `str`, `string` | any non-empty segment | `Str` |
//! | `int` | ASCII digits fitting in `i64` | `Int` |
//! | `slug` | ASCII letters, digits, `-`, `_` | `Str` |
//! | `uuid` | hyphenated UUID | `Uuid` |
//! | `path`, `*` | the rest of the path, `/` included | `Path` |

use grappelli_http::ParamValue;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static SLUG_PATTERN: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid slug regex"));

/// A parameter's type constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Converter {
	Str,
	Int,
	Slug,
	Uuid,
	/// Wildcard: consumes every remaining segment.
	Path,
}

impl Converter {
	/// Looks up a constraint by the name used in patterns.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_urls::converters::Converter;
	///
	/// assert_eq!(Converter::from_name("int"), Some(Converter::Int));
	/// assert_eq!(Converter::from_name("*"), Some(Converter::Path));
	/// assert_eq!(Converter::from_name("float"), None);
	/// ```
	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"" | "str" | "string" => Some(Converter::Str),
			"int" => Some(Converter::Int),
			"slug" => Some(Converter::Slug),
			"uuid" => Some(Converter::Uuid),
			"path" | "*" => Some(Converter::Path),
			_ => None,
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			Converter::Str => "str",
			Converter::Int => "int",
			Converter::Slug => "slug",
			Converter::Uuid => "uuid",
			Converter::Path => "path",
		}
	}

	pub fn is_wildcard(&self) -> bool {
		matches!(self, Converter::Path)
	}

	/// Coerces a decoded path segment; `None` means the segment does not match.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::ParamValue;
	/// use grappelli_urls::converters::Converter;
	///
	/// assert_eq!(Converter::Int.to_value("42"), Some(ParamValue::Int(42)));
	/// assert_eq!(Converter::Int.to_value("abc"), None);
	/// assert_eq!(Converter::Slug.to_value("hello world"), None);
	/// ```
	pub fn to_value(&self, raw: &str) -> Option<ParamValue> {
		match self {
			Converter::Str => (!raw.is_empty()).then(|| ParamValue::Str(raw.to_string())),
			Converter::Int => parse_int(raw).map(ParamValue::Int),
			Converter::Slug => SLUG_PATTERN
				.is_match(raw)
				.then(|| ParamValue::Str(raw.to_string())),
			Converter::Uuid => parse_uuid(raw).map(ParamValue::Uuid),
			Converter::Path => Some(ParamValue::Path(raw.to_string())),
		}
	}

	/// Checks a value supplied for reverse lookup and returns its canonical
	/// (still unencoded) text.
	///
	/// Returns `None` when the value would not be accepted by
	/// [`to_value`](Self::to_value).
	pub fn to_url(&self, value: &str) -> Option<String> {
		match self {
			Converter::Int => parse_int(value).map(|n| n.to_string()),
			Converter::Uuid => parse_uuid(value).map(|id| id.hyphenated().to_string()),
			Converter::Str | Converter::Slug => self.to_value(value).map(|_| value.to_string()),
			Converter::Path => Some(value.trim_matches('/').to_string()),
		}
	}
}

fn parse_int(raw: &str) -> Option<i64> {
	if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	raw.parse().ok()
}

fn parse_uuid(raw: &str) -> Option<Uuid> {
	// Only the hyphenated form, as it appears in URLs
	if raw.len() != 36 {
		return None;
	}
	Uuid::parse_str(raw).ok()
}
