//! URL reverse resolution.
//!
//! Inspired by Django's `django.urls.reverse()`: a route is looked up by its
//! qualified name and its patterns, mount prefixes included, are filled with
//! the given parameters.

use crate::namespace::split_qualified;
use crate::pattern::{join_url, reject_unused};
use crate::route::{Route, RouteTarget};
use crate::table::RouteTable;
use grappelli_core::exception::{Error, Result};
use std::collections::{HashMap, HashSet};

impl RouteTable {
	/// Builds the URL of the route named `name`.
	///
	/// `name` is qualified by the namespaces of the mounts leading to the
	/// route (`"app1.user_list"`; `"app1:user_list"` is accepted too). Mounts
	/// without a namespace are searched as if their routes were declared in
	/// the enclosing table.
	///
	/// # Errors
	///
	/// Returns [`Error::ReverseLookup`] when no route has that name, or when a
	/// parameter is missing, fails its type constraint, or is not used by any
	/// pattern on the way to the route.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::{Request, Response, handler_fn};
	/// use grappelli_urls::{RouteTable, include, path};
	/// use std::collections::HashMap;
	///
	/// let app = RouteTable::builder()
	///     .route(
	///         path("/users/{id:int}/", handler_fn(|_req: Request| async { Ok(Response::ok()) }))
	///             .unwrap()
	///             .with_name("user_detail"),
	///     )
	///     .build()
	///     .unwrap();
	/// let root = RouteTable::builder()
	///     .route(include("/app1/", app).unwrap())
	///     .build()
	///     .unwrap();
	///
	/// let params = HashMap::from([("id".to_string(), "42".to_string())]);
	/// assert_eq!(root.reverse("app1.user_detail", &params).unwrap(), "/app1/users/42/");
	/// assert!(root.reverse("user_detail", &params).is_err());
	/// ```
	pub fn reverse(&self, name: &str, params: &HashMap<String, String>) -> Result<String> {
		let qualified = split_qualified(name);
		let chain = if qualified.is_empty() {
			None
		} else {
			self.find_chain(&qualified)
		};
		let chain =
			chain.ok_or_else(|| Error::ReverseLookup(format!("no route named '{}'", name)))?;

		let mut used = HashSet::new();
		let mut segments = Vec::new();
		for route in &chain {
			route.pattern().render(params, &mut used, &mut segments)?;
		}
		reject_unused(params, &used)?;

		// The innermost pattern with segments decides the trailing slash
		let trailing_slash = chain
			.iter()
			.rev()
			.map(|route| route.pattern())
			.find(|pattern| !pattern.segments().is_empty())
			.is_some_and(|pattern| pattern.has_trailing_slash());

		let url = join_url(&segments, trailing_slash);
		tracing::trace!(name, %url, "route reversed");
		Ok(url)
	}

	/// [`reverse`](Self::reverse) with parameters given as pairs.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::{Request, Response, handler_fn};
	/// use grappelli_urls::{RouteTable, path};
	///
	/// let table = RouteTable::builder()
	///     .route(
	///         path("/posts/{year:int}/{slug:slug}", handler_fn(|_req: Request| async { Ok(Response::ok()) }))
	///             .unwrap()
	///             .with_name("post"),
	///     )
	///     .build()
	///     .unwrap();
	///
	/// let error = table.reverse_with("post", &[("year", 2024)]).unwrap_err();
	/// assert!(error.to_string().contains("slug"));
	/// assert_eq!(
	///     table.reverse_with("post", &[("year", "2024"), ("slug", "hello")]).unwrap(),
	///     "/posts/2024/hello"
	/// );
	/// ```
	pub fn reverse_with<K, V>(&self, name: &str, params: &[(K, V)]) -> Result<String>
	where
		K: AsRef<str>,
		V: ToString,
	{
		let params: HashMap<String, String> = params
			.iter()
			.map(|(key, value)| (key.as_ref().to_string(), value.to_string()))
			.collect();
		self.reverse(name, &params)
	}

	/// Finds the routes leading to `qualified`, outermost first.
	fn find_chain(&self, qualified: &[&str]) -> Option<Vec<&Route>> {
		for route in self.entries() {
			match route.target() {
				RouteTarget::Handler(_) => {
					if let [name] = qualified {
						if route.name() == Some(*name) {
							return Some(vec![route]);
						}
					}
				}
				RouteTarget::Include(table) => {
					let rest = match route.namespace() {
						Some(namespace) => match namespace.strip_from(qualified) {
							Some(rest) if !rest.is_empty() => rest,
							_ => continue,
						},
						None => qualified,
					};
					if let Some(mut chain) = table.find_chain(rest) {
						chain.insert(0, route);
						return Some(chain);
					}
				}
			}
		}
		None
	}
}

#[cfg(test)]
mod tests {
	use crate::route::{include, path};
	use crate::table::RouteTable;
	use grappelli_core::exception::Error;
	use grappelli_http::{Request, Response, handler_fn};
	use rstest::rstest;
	use std::collections::HashMap;

	fn named(pattern: &str, name: &str) -> crate::route::Route {
		path(
			pattern,
			handler_fn(|_req: Request| async { Ok(Response::ok()) }),
		)
		.unwrap()
		.with_name(name)
	}

	fn site() -> RouteTable {
		let users = RouteTable::builder()
			.route(named("/", "list"))
			.route(named("/{id:int}/", "detail"))
			.build()
			.unwrap();
		let v1 = RouteTable::builder()
			.route(include("/users/", users).unwrap())
			.build()
			.unwrap();
		let shared = RouteTable::builder()
			.route(named("/health", "health"))
			.build()
			.unwrap();
		RouteTable::builder()
			.route(named("/", "home"))
			.route(include("/api/v1/", v1).unwrap())
			.route(include("/", shared).unwrap())
			.route(include("/t/{tenant:slug}/", RouteTable::builder()
				.route(named("/dashboard", "dashboard"))
				.build()
				.unwrap()).unwrap().with_namespace("tenant"))
			.build()
			.unwrap()
	}

	#[rstest]
	#[case("home", &[], "/")]
	#[case("api.v1.users.list", &[], "/api/v1/users/")]
	#[case("api:v1:users:detail", &[("id", "7")], "/api/v1/users/7/")]
	#[case("health", &[], "/health")]
	#[case("tenant.dashboard", &[("tenant", "acme")], "/t/acme/dashboard")]
	fn test_reverse_through_mounts(
		#[case] name: &str,
		#[case] params: &[(&str, &str)],
		#[case] expected: &str,
	) {
		assert_eq!(site().reverse_with(name, params).unwrap(), expected);
	}

	#[rstest]
	#[case("missing", &[], "no route named 'missing'")]
	#[case("", &[], "no route named ''")]
	#[case("users.list", &[], "no route named")]
	#[case("api.v1", &[], "no route named")]
	#[case("api.v1.users.detail", &[], "missing parameter 'id'")]
	#[case("api.v1.users.detail", &[("id", "x")], "not a valid int")]
	#[case("home", &[("page", "2")], "unexpected parameters: page")]
	fn test_reverse_errors(
		#[case] name: &str,
		#[case] params: &[(&str, &str)],
		#[case] expected: &str,
	) {
		match site().reverse_with(name, params) {
			Err(Error::ReverseLookup(message)) => assert!(
				message.contains(expected),
				"'{}' does not contain '{}'",
				message,
				expected
			),
			other => panic!("expected reverse error, got {:?}", other),
		}
	}

	#[rstest]
	fn test_reversed_url_resolves_to_same_route() {
		let table = site();
		let params = HashMap::from([("tenant".to_string(), "big-co".to_string())]);
		let url = table.reverse("tenant.dashboard", &params).unwrap();

		match table.resolve(&hyper::Method::GET, &url) {
			crate::table::Resolution::Matched(resolved) => {
				assert_eq!(resolved.route_name.as_deref(), Some("dashboard"));
				assert_eq!(resolved.params.get_str("tenant"), Some("big-co"));
			}
			other => panic!("unexpected {:?}", other),
		}
	}
}
