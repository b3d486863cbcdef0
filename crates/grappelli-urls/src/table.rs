//! Route tables and resolution.

use crate::namespace::Namespace;
use crate::pattern::split_path;
use crate::route::{Route, RouteTarget};
use grappelli_core::exception::{Error, Result};
use grappelli_http::{Handler, PathParams, ResolverMatch};
use hyper::Method;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// An ordered, immutable list of routes.
///
/// Resolution tries routes in the order they were added and the first one
/// that matches both path and method wins. Tables are rebuilt rather than
/// modified.
#[derive(Clone, Default)]
pub struct RouteTable {
	routes: Vec<Route>,
}

/// Collects routes for a [`RouteTable`].
#[derive(Default)]
pub struct RouteTableBuilder {
	routes: Vec<Route>,
}

impl RouteTableBuilder {
	/// Appends a route after the ones already added.
	pub fn route(mut self, route: Route) -> Self {
		self.routes.push(route);
		self
	}

	pub fn routes(mut self, routes: impl IntoIterator<Item = Route>) -> Self {
		self.routes.extend(routes);
		self
	}

	/// Validates and freezes the table.
	///
	/// # Errors
	///
	/// Returns [`Error::ImproperlyConfigured`] when a route name is empty or
	/// contains `.` or `:`, when two routes share a name, or when two mounts
	/// share a namespace.
	pub fn build(self) -> Result<RouteTable> {
		let mut names = HashSet::new();
		let mut namespaces = HashSet::new();
		for route in &self.routes {
			if let Some(name) = route.name() {
				if name.is_empty() || name.contains(['.', ':']) {
					return Err(Error::ImproperlyConfigured(format!(
						"route name '{}' for '{}' must be non-empty and contain no '.' or ':'",
						name,
						route.pattern()
					)));
				}
				if !names.insert(name) {
					return Err(Error::ImproperlyConfigured(format!(
						"route name '{}' is used more than once",
						name
					)));
				}
			}
			if let Some(namespace) = route.namespace() {
				if !namespaces.insert(namespace.clone()) {
					return Err(Error::ImproperlyConfigured(format!(
						"namespace '{}' is mounted more than once",
						namespace
					)));
				}
			}
		}
		Ok(RouteTable {
			routes: self.routes,
		})
	}
}

/// Routes whose pattern matched but whose method set did not.
#[derive(Default)]
struct MethodRejection {
	path_matched: bool,
	allowed: Vec<Method>,
}

/// Outcome of [`RouteTable::resolve`].
pub enum Resolution {
	Matched(ResolvedRoute),
	/// Some route matched the path, but none accepted the method.
	MethodNotAllowed { allowed: Vec<Method> },
	NotFound,
}

impl Resolution {
	/// Converts non-matches into the errors the dispatcher maps to 404/405.
	pub fn into_result(self, method: &Method, path: &str) -> Result<ResolvedRoute> {
		match self {
			Resolution::Matched(resolved) => Ok(resolved),
			Resolution::MethodNotAllowed { allowed } => Err(Error::MethodNotAllowed {
				method: method.clone(),
				path: path.to_string(),
				allowed,
			}),
			Resolution::NotFound => Err(Error::NotFound(path.to_string())),
		}
	}

	pub fn is_match(&self) -> bool {
		matches!(self, Resolution::Matched(_))
	}
}

impl fmt::Debug for Resolution {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Resolution::Matched(resolved) => f.debug_tuple("Matched").field(resolved).finish(),
			Resolution::MethodNotAllowed { allowed } => f
				.debug_struct("MethodNotAllowed")
				.field("allowed", allowed)
				.finish(),
			Resolution::NotFound => f.write_str("NotFound"),
		}
	}
}

/// A successful resolution.
#[derive(Clone)]
pub struct ResolvedRoute {
	pub handler: Arc<dyn Handler>,
	/// Parameters of every pattern on the way down, outermost first.
	pub params: PathParams,
	pub route_name: Option<String>,
	pub namespaces: Vec<String>,
	/// Full matched pattern, mount prefixes included.
	pub route: String,
}

impl ResolvedRoute {
	/// The description stored on the request.
	pub fn resolver_match(&self) -> ResolverMatch {
		ResolverMatch {
			route_name: self.route_name.clone(),
			namespaces: self.namespaces.clone(),
			route: self.route.clone(),
		}
	}
}

impl fmt::Debug for ResolvedRoute {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolvedRoute")
			.field("route", &self.route)
			.field("route_name", &self.route_name)
			.field("namespaces", &self.namespaces)
			.field("params", &self.params)
			.finish()
	}
}

/// A flattened view of one terminal route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
	/// Full pattern, mount prefixes included.
	pub pattern: String,
	/// Namespace-qualified name.
	pub name: Option<String>,
	pub methods: Option<Vec<Method>>,
}

impl RouteTable {
	pub fn builder() -> RouteTableBuilder {
		RouteTableBuilder::default()
	}

	/// A table with no routes; every path resolves to [`Resolution::NotFound`].
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.routes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.routes.is_empty()
	}

	/// Direct entries, in resolution order.
	pub fn entries(&self) -> &[Route] {
		&self.routes
	}

	/// Resolves `path` for `method`.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::{Method, Request, Response, handler_fn};
	/// use grappelli_urls::{Resolution, RouteTable, include, path};
	///
	/// let app = RouteTable::builder()
	///     .route(
	///         path("/users/{id:int}", handler_fn(|_req: Request| async { Ok(Response::ok()) }))
	///             .unwrap()
	///             .with_name("user_detail")
	///             .with_methods([Method::GET]),
	///     )
	///     .build()
	///     .unwrap();
	/// let root = RouteTable::builder()
	///     .route(include("/app1/", app).unwrap())
	///     .build()
	///     .unwrap();
	///
	/// match root.resolve(&Method::GET, "/app1/users/42") {
	///     Resolution::Matched(resolved) => {
	///         assert_eq!(resolved.params.get_int("id"), Some(42));
	///         assert_eq!(resolved.route, "/app1/users/{id:int}");
	///     }
	///     other => panic!("unexpected {:?}", other),
	/// }
	/// assert!(matches!(
	///     root.resolve(&Method::DELETE, "/app1/users/42"),
	///     Resolution::MethodNotAllowed { .. }
	/// ));
	/// assert!(matches!(root.resolve(&Method::GET, "/app2/users/42"), Resolution::NotFound));
	/// ```
	pub fn resolve(&self, method: &Method, path: &str) -> Resolution {
		let Some(segments) = split_path(path) else {
			tracing::trace!(path, "path does not decode to valid UTF-8");
			return Resolution::NotFound;
		};
		let mut rejected = MethodRejection::default();
		match self.resolve_segments(method, &segments, &mut rejected) {
			Some(resolved) => {
				tracing::trace!(path, route = %resolved.route, "route resolved");
				Resolution::Matched(resolved)
			}
			None if rejected.path_matched => {
				let allowed = rejected.allowed;
				tracing::trace!(path, %method, "path matched but method not allowed");
				Resolution::MethodNotAllowed { allowed }
			}
			None => {
				tracing::trace!(path, "no route matched");
				Resolution::NotFound
			}
		}
	}

	fn resolve_segments(
		&self,
		method: &Method,
		segments: &[String],
		rejected: &mut MethodRejection,
	) -> Option<ResolvedRoute> {
		for route in &self.routes {
			match route.target() {
				RouteTarget::Handler(handler) => {
					let Some(params) = route.pattern().match_segments(segments) else {
						continue;
					};
					if !route.accepts(method) {
						rejected.path_matched = true;
						for candidate in route.allowed_methods() {
							if !rejected.allowed.contains(&candidate) {
								rejected.allowed.push(candidate);
							}
						}
						continue;
					}
					return Some(ResolvedRoute {
						handler: Arc::clone(handler),
						params,
						route_name: route.name().map(str::to_string),
						namespaces: Vec::new(),
						route: route.pattern().as_str().to_string(),
					});
				}
				RouteTarget::Include(table) => {
					let Some((params, consumed)) = route.pattern().match_leading(segments) else {
						continue;
					};
					let Some(mut resolved) =
						table.resolve_segments(method, &segments[consumed..], rejected)
					else {
						continue;
					};
					let mut merged = params;
					merged.merge(resolved.params);
					resolved.params = merged;
					if let Some(namespace) = route.namespace() {
						let mut namespaces = namespace.components().to_vec();
						namespaces.append(&mut resolved.namespaces);
						resolved.namespaces = namespaces;
					}
					resolved.route = join_patterns(route.pattern().as_str(), &resolved.route);
					return Some(resolved);
				}
			}
		}
		None
	}

	/// Every parameter name used anywhere in the table, nested tables included.
	pub fn param_names(&self) -> HashSet<String> {
		let mut names = HashSet::new();
		for route in &self.routes {
			names.extend(route.pattern().param_names().map(str::to_string));
			if let RouteTarget::Include(table) = route.target() {
				names.extend(table.param_names());
			}
		}
		names
	}

	/// Flattens the tree into one record per terminal route, in resolution
	/// order.
	pub fn routes(&self) -> Vec<RouteInfo> {
		let mut out = Vec::new();
		self.collect_routes("", &Namespace::default(), &mut out);
		out
	}

	fn collect_routes(&self, prefix: &str, namespace: &Namespace, out: &mut Vec<RouteInfo>) {
		for route in &self.routes {
			let pattern = join_patterns(prefix, route.pattern().as_str());
			match route.target() {
				RouteTarget::Handler(_) => out.push(RouteInfo {
					name: route.name().map(|name| {
						if namespace.is_empty() {
							name.to_string()
						} else {
							format!("{}.{}", namespace, name)
						}
					}),
					methods: route.methods().map(<[Method]>::to_vec),
					pattern,
				}),
				RouteTarget::Include(table) => {
					let nested = match route.namespace() {
						Some(own) => own
							.components()
							.iter()
							.fold(namespace.clone(), |ns, part| ns.append(part)),
						None => namespace.clone(),
					};
					table.collect_routes(&pattern, &nested, out);
				}
			}
		}
	}
}

impl fmt::Debug for RouteTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteTable")
			.field("routes", &self.routes)
			.finish()
	}
}

/// Joins a mount prefix and an inner pattern (`/app1/` + `/users` → `/app1/users`).
pub(crate) fn join_patterns(prefix: &str, inner: &str) -> String {
	let prefix = prefix.trim_end_matches('/');
	let inner = inner.trim_start_matches('/');
	format!("{}/{}", prefix, inner)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::route::{include, path};
	use grappelli_http::{Request, Response, handler_fn};
	use rstest::rstest;

	fn named(pattern: &str, name: &str) -> Route {
		path(
			pattern,
			handler_fn(|_req: Request| async { Ok(Response::ok()) }),
		)
		.unwrap()
		.with_name(name)
	}

	fn resolved_name(resolution: Resolution) -> Option<String> {
		match resolution {
			Resolution::Matched(resolved) => resolved.route_name,
			_ => None,
		}
	}

	#[rstest]
	fn test_first_registered_route_wins() {
		let table = RouteTable::builder()
			.route(named("/users/{name}", "by_name"))
			.route(named("/users/me", "me"))
			.build()
			.unwrap();

		assert_eq!(
			resolved_name(table.resolve(&Method::GET, "/users/me")).as_deref(),
			Some("by_name")
		);
	}

	#[rstest]
	fn test_typed_parameter_falls_through_to_later_route() {
		let table = RouteTable::builder()
			.route(named("/users/{id:int}", "by_id"))
			.route(named("/users/{name}", "by_name"))
			.build()
			.unwrap();

		assert_eq!(
			resolved_name(table.resolve(&Method::GET, "/users/42")).as_deref(),
			Some("by_id")
		);
		assert_eq!(
			resolved_name(table.resolve(&Method::GET, "/users/alice")).as_deref(),
			Some("by_name")
		);
	}

	#[rstest]
	fn test_method_mismatch_is_not_not_found() {
		let table = RouteTable::builder()
			.route(named("/items", "list").with_methods([Method::GET]))
			.route(named("/items", "create").with_methods([Method::POST]))
			.build()
			.unwrap();

		assert_eq!(
			resolved_name(table.resolve(&Method::POST, "/items")).as_deref(),
			Some("create")
		);
		match table.resolve(&Method::DELETE, "/items") {
			Resolution::MethodNotAllowed { allowed } => {
				assert_eq!(allowed, vec![Method::GET, Method::HEAD, Method::POST]);
			}
			other => panic!("expected 405, got {:?}", other),
		}
		assert!(matches!(
			table.resolve(&Method::DELETE, "/other"),
			Resolution::NotFound
		));
	}

	#[rstest]
	fn test_mount_merges_parameters_and_namespaces() {
		let posts = RouteTable::builder()
			.route(named("/posts/{id:int}/", "post_detail"))
			.build()
			.unwrap();
		let tenants = RouteTable::builder()
			.route(include("/blog/", posts).unwrap())
			.build()
			.unwrap();
		let root = RouteTable::builder()
			.route(include("/t/{tenant:slug}/", tenants).unwrap().with_namespace("tenant"))
			.build()
			.unwrap();

		match root.resolve(&Method::GET, "/t/acme/blog/posts/9/") {
			Resolution::Matched(resolved) => {
				let names: Vec<&str> = resolved.params.iter().map(|(k, _)| k).collect();
				assert_eq!(names, vec!["tenant", "id"]);
				assert_eq!(resolved.params.get_str("tenant"), Some("acme"));
				assert_eq!(resolved.params.get_int("id"), Some(9));
				assert_eq!(resolved.namespaces, vec!["tenant", "blog"]);
				assert_eq!(resolved.route, "/t/{tenant:slug}/blog/posts/{id:int}/");
				assert_eq!(
					resolved.resolver_match().view_name().as_deref(),
					Some("tenant.blog.post_detail")
				);
			}
			other => panic!("unexpected {:?}", other),
		}
	}

	#[rstest]
	fn test_mount_without_inner_match_continues_with_siblings() {
		let app = RouteTable::builder()
			.route(named("/users", "user_list"))
			.build()
			.unwrap();
		let root = RouteTable::builder()
			.route(include("/app1/", app).unwrap())
			.route(named("/app1/about", "about"))
			.build()
			.unwrap();

		assert_eq!(
			resolved_name(root.resolve(&Method::GET, "/app1/about")).as_deref(),
			Some("about")
		);
	}

	#[rstest]
	fn test_method_not_allowed_inside_mount() {
		let app = RouteTable::builder()
			.route(named("/users", "user_list").with_methods([Method::POST]))
			.build()
			.unwrap();
		let root = RouteTable::builder()
			.route(include("/app1/", app).unwrap())
			.build()
			.unwrap();

		let error = root
			.resolve(&Method::GET, "/app1/users")
			.into_result(&Method::GET, "/app1/users")
			.unwrap_err();
		assert_eq!(error.allowed_methods(), Some(&[Method::POST][..]));
	}

	#[rstest]
	#[case(vec![named("/a", "dup"), named("/b", "dup")], "used more than once")]
	#[case(vec![named("/a", "bad.name")], "must be non-empty")]
	#[case(vec![named("/a", "")], "must be non-empty")]
	fn test_build_rejects_bad_names(#[case] routes: Vec<Route>, #[case] expected: &str) {
		match RouteTable::builder().routes(routes).build() {
			Err(Error::ImproperlyConfigured(message)) => assert!(message.contains(expected)),
			other => panic!("expected configuration error, got {:?}", other),
		}
	}

	#[rstest]
	fn test_empty_method_set_is_method_not_allowed() {
		let table = RouteTable::builder()
			.route(named("/items", "items").with_methods(Vec::<Method>::new()))
			.build()
			.unwrap();

		match table.resolve(&Method::GET, "/items") {
			Resolution::MethodNotAllowed { allowed } => assert!(allowed.is_empty()),
			other => panic!("expected MethodNotAllowed, got {:?}", other),
		}
		assert!(matches!(table.resolve(&Method::GET, "/other"), Resolution::NotFound));
	}

	#[rstest]
	fn test_undecodable_path_is_not_found() {
		let table = RouteTable::builder()
			.route(named("/files/{name}", "file"))
			.build()
			.unwrap();

		assert!(matches!(table.resolve(&Method::GET, "/files/%FF"), Resolution::NotFound));
		assert!(matches!(table.resolve(&Method::GET, "/files/%C3%A9"), Resolution::Matched(_)));
	}

	#[rstest]
	fn test_build_rejects_duplicate_namespaces() {
		let app = Arc::new(RouteTable::empty());
		let result = RouteTable::builder()
			.route(include("/shop/", app.clone()).unwrap())
			.route(include("/store/", app).unwrap().with_namespace("shop"))
			.build();
		assert!(matches!(result, Err(Error::ImproperlyConfigured(_))));
	}

	#[rstest]
	fn test_routes_flattens_tree() {
		let app = RouteTable::builder()
			.route(named("/users", "user_list").with_methods([Method::GET]))
			.build()
			.unwrap();
		let root = RouteTable::builder()
			.route(named("/", "home"))
			.route(include("/app1/", app).unwrap())
			.build()
			.unwrap();

		assert_eq!(
			root.routes(),
			vec![
				RouteInfo {
					pattern: "/".to_string(),
					name: Some("home".to_string()),
					methods: None,
				},
				RouteInfo {
					pattern: "/app1/users".to_string(),
					name: Some("app1.user_list".to_string()),
					methods: Some(vec![Method::GET]),
				},
			]
		);
	}

	#[rstest]
	#[case("", "/users", "/users")]
	#[case("/", "/users", "/users")]
	#[case("/app1/", "/users", "/app1/users")]
	#[case("/app1", "users/", "/app1/users/")]
	#[case("/app1/", "/", "/app1/")]
	fn test_join_patterns(#[case] prefix: &str, #[case] inner: &str, #[case] expected: &str) {
		assert_eq!(join_patterns(prefix, inner), expected);
	}
}
