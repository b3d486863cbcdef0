//! Information about the route that resolved a request.

use serde::Serialize;

/// Describes which route handled the request.
///
/// Set by the dispatcher after resolution and before the handler runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolverMatch {
	/// Name of the matched route, if it has one.
	pub route_name: Option<String>,
	/// Namespaces of the mounts traversed, outermost first.
	pub namespaces: Vec<String>,
	/// Full route pattern, mount prefixes included (e.g. `/app1/users/{id:int}`).
	pub route: String,
}

impl ResolverMatch {
	/// Namespace-qualified route name, e.g. `app1.user_list`.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::ResolverMatch;
	///
	/// let resolved = ResolverMatch {
	///     route_name: Some("user_list".to_string()),
	///     namespaces: vec!["app1".to_string()],
	///     route: "/app1/users".to_string(),
	/// };
	/// assert_eq!(resolved.view_name().as_deref(), Some("app1.user_list"));
	/// ```
	pub fn view_name(&self) -> Option<String> {
		let name = self.route_name.as_ref()?;
		if self.namespaces.is_empty() {
			return Some(name.clone());
		}
		Some(format!("{}.{}", self.namespaces.join("."), name))
	}

	/// Dotted namespace path, empty for routes of the root table.
	pub fn namespace(&self) -> String {
		self.namespaces.join(".")
	}
}
