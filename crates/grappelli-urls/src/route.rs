//! Route declarations.

use crate::namespace::Namespace;
use crate::pattern::{PathPattern, Segment};
use crate::table::RouteTable;
use grappelli_core::exception::{Error, Result};
use grappelli_http::Handler;
use hyper::Method;
use std::fmt;
use std::sync::Arc;

/// What a route leads to.
#[derive(Clone)]
pub enum RouteTarget {
	/// A terminal route.
	Handler(Arc<dyn Handler>),
	/// A mount: the matched prefix is stripped and the rest of the path is
	/// resolved against the nested table.
	Include(Arc<RouteTable>),
}

/// A single entry of a [`RouteTable`].
#[derive(Clone)]
pub struct Route {
	pattern: PathPattern,
	target: RouteTarget,
	name: Option<String>,
	methods: Option<Vec<Method>>,
	namespace: Option<Namespace>,
}

/// Declares a terminal route.
///
/// # Errors
///
/// Returns [`Error::PatternSyntax`] when the pattern does not compile.
///
/// # Examples
///
/// ```
/// use grappelli_http::{Method, Request, Response, handler_fn};
/// use grappelli_urls::path;
///
/// let route = path("/users/{id:int}", handler_fn(|_req: Request| async { Ok(Response::ok()) }))
///     .unwrap()
///     .with_name("user_detail")
///     .with_methods([Method::GET]);
/// assert_eq!(route.name(), Some("user_detail"));
/// ```
pub fn path<H>(pattern: &str, handler: H) -> Result<Route>
where
	H: Handler + 'static,
{
	Ok(Route {
		pattern: PathPattern::new(pattern)?,
		target: RouteTarget::Handler(Arc::new(handler)),
		name: None,
		methods: None,
		namespace: None,
	})
}

/// Mounts `table` under `prefix`.
///
/// The mount's namespace defaults to the literal segments of the prefix
/// joined with `.` (`/app1/` → `app1`); a prefix without literals (such as
/// `/`) mounts the table without a namespace.
///
/// # Errors
///
/// Returns [`Error::PatternSyntax`] when the prefix does not compile, ends
/// in a wildcard, or declares a parameter that the nested table also uses.
pub fn include(prefix: &str, table: impl Into<Arc<RouteTable>>) -> Result<Route> {
	let pattern = PathPattern::new(prefix)?;
	if pattern.has_wildcard() {
		return Err(Error::pattern(prefix, "an include prefix cannot end in a wildcard"));
	}

	let table = table.into();
	let nested = table.param_names();
	if let Some(clash) = pattern.param_names().find(|name| nested.contains(*name)) {
		return Err(Error::pattern(
			prefix,
			format!("parameter '{}' is also used by the included routes", clash),
		));
	}

	let literals: Vec<&str> = pattern
		.segments()
		.iter()
		.filter_map(|segment| match segment {
			Segment::Literal(literal) => Some(literal.as_str()),
			Segment::Param { .. } => None,
		})
		.collect();
	let namespace = Namespace::new(&literals.join("."));

	Ok(Route {
		pattern,
		target: RouteTarget::Include(table),
		name: None,
		methods: None,
		namespace: (!namespace.is_empty()).then_some(namespace),
	})
}

impl Route {
	/// Names the route for reverse lookup. Names are unique per table.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Restricts a terminal route to `methods`. Routes without a method list
	/// accept every method; `HEAD` is accepted wherever `GET` is.
	pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
		let mut list: Vec<Method> = Vec::new();
		for method in methods {
			if !list.contains(&method) {
				list.push(method);
			}
		}
		self.methods = Some(list);
		self
	}

	/// Overrides a mount's namespace. Has no effect on terminal routes.
	pub fn with_namespace(mut self, namespace: &str) -> Self {
		if self.is_include() {
			let namespace = Namespace::new(namespace);
			self.namespace = (!namespace.is_empty()).then_some(namespace);
		}
		self
	}

	/// Mounts without a namespace: nested names are reversed unqualified.
	pub fn without_namespace(mut self) -> Self {
		self.namespace = None;
		self
	}

	pub fn pattern(&self) -> &PathPattern {
		&self.pattern
	}

	pub fn target(&self) -> &RouteTarget {
		&self.target
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn methods(&self) -> Option<&[Method]> {
		self.methods.as_deref()
	}

	pub fn namespace(&self) -> Option<&Namespace> {
		self.namespace.as_ref()
	}

	pub fn is_include(&self) -> bool {
		matches!(self.target, RouteTarget::Include(_))
	}

	/// Whether a terminal route accepts `method`.
	pub fn accepts(&self, method: &Method) -> bool {
		match &self.methods {
			None => true,
			Some(methods) => {
				methods.contains(method) || (*method == Method::HEAD && methods.contains(&Method::GET))
			}
		}
	}

	/// Methods to advertise in an `Allow` header.
	pub fn allowed_methods(&self) -> Vec<Method> {
		let Some(methods) = &self.methods else {
			return Vec::new();
		};
		let mut allowed = methods.clone();
		if allowed.contains(&Method::GET) && !allowed.contains(&Method::HEAD) {
			allowed.push(Method::HEAD);
		}
		allowed
	}
}

impl fmt::Debug for Route {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("Route");
		debug.field("pattern", &self.pattern.as_str());
		debug.field("name", &self.name);
		debug.field("methods", &self.methods);
		match &self.target {
			RouteTarget::Handler(_) => debug.field("target", &"handler"),
			RouteTarget::Include(table) => debug
				.field("namespace", &self.namespace)
				.field("target", &format!("include({} routes)", table.len())),
		};
		debug.finish()
	}
}
