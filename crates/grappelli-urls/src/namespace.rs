//! Namespaces for reverse lookup.
//!
//! Mounted route tables qualify the names of their routes with the mount's
//! namespace, so `user_list` inside a table mounted as `app1` is reversed as
//! `"app1.user_list"`. Nested mounts add further components
//! (`"api.v1.users.detail"`). `:` is accepted as a separator too.

use std::fmt;

/// A dotted namespace path such as `api.v1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Namespace {
	components: Vec<String>,
}

impl Namespace {
	/// Parses a dotted (or colon-separated) namespace.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_urls::Namespace;
	///
	/// let ns = Namespace::new("api.v1");
	/// assert_eq!(ns.components(), &["api", "v1"]);
	/// assert_eq!(Namespace::new("api:v1"), ns);
	/// assert_eq!(ns.to_string(), "api.v1");
	/// ```
	pub fn new(path: &str) -> Self {
		Self {
			components: split_qualified(path)
				.into_iter()
				.map(str::to_string)
				.collect(),
		}
	}

	pub fn components(&self) -> &[String] {
		&self.components
	}

	pub fn is_empty(&self) -> bool {
		self.components.is_empty()
	}

	pub fn len(&self) -> usize {
		self.components.len()
	}

	pub fn append(&self, component: &str) -> Namespace {
		let mut components = self.components.clone();
		components.extend(split_qualified(component).into_iter().map(str::to_string));
		Self { components }
	}

	/// If `qualified` starts with this namespace, returns the remaining
	/// components.
	pub(crate) fn strip_from<'a, 'b>(&self, qualified: &'a [&'b str]) -> Option<&'a [&'b str]> {
		if qualified.len() < self.components.len() {
			return None;
		}
		let (head, rest) = qualified.split_at(self.components.len());
		head.iter()
			.zip(&self.components)
			.all(|(given, own)| *given == own.as_str())
			.then_some(rest)
	}
}

impl fmt::Display for Namespace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.components.join("."))
	}
}

/// Splits a qualified route name on `.` and `:`, dropping empty parts.
pub fn split_qualified(name: &str) -> Vec<&str> {
	name.split(['.', ':']).filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("app1.user_list", vec!["app1", "user_list"])]
	#[case("api:v1:detail", vec!["api", "v1", "detail"])]
	#[case("api.v1:detail", vec!["api", "v1", "detail"])]
	#[case("..x..", vec!["x"])]
	#[case("", vec![])]
	fn test_split_qualified(#[case] name: &str, #[case] expected: Vec<&str>) {
		assert_eq!(split_qualified(name), expected);
	}

	#[rstest]
	fn test_strip_from() {
		let ns = Namespace::new("api.v1");
		assert_eq!(
			ns.strip_from(&["api", "v1", "users", "list"]),
			Some(&["users", "list"][..])
		);
		assert_eq!(ns.strip_from(&["api", "v2", "users"]), None);
		assert_eq!(ns.strip_from(&["api"]), None);
		assert_eq!(
			Namespace::default().strip_from(&["list"]),
			Some(&["list"][..])
		);
	}

	#[rstest]
	fn test_append() {
		let ns = Namespace::new("api").append("v2");
		assert_eq!(ns.to_string(), "api.v2");
		assert_eq!(ns.components(), &["api".to_string(), "v2".to_string()][..]);
		assert_eq!(ns.len(), 2);
	}
}
