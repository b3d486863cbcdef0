//! The request dispatcher.

use crate::exception::ExceptionHandler;
use crate::reply;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use bytes::Bytes;
use grappelli_conf::Settings;
use grappelli_core::exception::{Error, Result};
use grappelli_http::{
	Endpoint, Method, Middleware, MiddlewareChain, Request, Response, TemplateRenderer,
};
use grappelli_middleware::MiddlewareRegistry;
use grappelli_urls::{ResolvedRoute, RouteTable};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Terminal step of the chain: resolve, bind parameters, run the handler and
/// normalize its reply.
struct RoutingEndpoint {
	urlconf: Arc<RouteTable>,
	renderer: Option<Arc<dyn TemplateRenderer>>,
}

#[async_trait]
impl Endpoint for RoutingEndpoint {
	async fn call(&self, mut request: Request) -> Result<Response> {
		let path = request.path().to_string();
		let resolved = self
			.urlconf
			.resolve(&request.method, &path)
			.into_result(&request.method, &path)?;
		let resolver_match = resolved.resolver_match();
		tracing::debug!(
			route = %resolver_match.route,
			view = ?resolver_match.view_name(),
			"dispatching to handler"
		);

		let ResolvedRoute {
			handler, params, ..
		} = resolved;
		request.set_path_params(params);
		request.resolver_match = Some(resolver_match);

		let reply = handler.handle(request).await?;
		reply::normalize(reply, self.renderer.as_deref())
	}
}

/// Runs requests through the middleware chain to their handler and always
/// produces a response.
///
/// Cloning is cheap; clones share the route table, so a [`reload`] through
/// one clone is seen by all of them.
///
/// [`reload`]: Dispatcher::reload
///
/// # Examples
///
/// ```
/// use grappelli_dispatch::Dispatcher;
/// use grappelli_http::{Method, Reply, Request, handler_fn};
/// use grappelli_urls::{RouteTable, path};
///
/// # tokio_test::block_on(async {
/// let urls = RouteTable::builder()
///     .route(path("/ping", handler_fn(|_req| async { Reply::json(&"pong") })).unwrap())
///     .build()
///     .unwrap();
/// let dispatcher = Dispatcher::builder(urls).build();
///
/// let response = dispatcher.handle(Request::builder().uri("/ping").build().unwrap()).await;
/// assert_eq!(response.body_text(), r#""pong""#);
///
/// let missing = dispatcher.handle(Request::builder().uri("/pong").build().unwrap()).await;
/// assert_eq!(missing.status.as_u16(), 404);
/// # });
/// ```
#[derive(Clone)]
pub struct Dispatcher {
	urlconf: Arc<ArcSwap<RouteTable>>,
	chain: Arc<MiddlewareChain>,
	renderer: Option<Arc<dyn TemplateRenderer>>,
	exceptions: ExceptionHandler,
	request_timeout: Option<Duration>,
}

impl Dispatcher {
	pub fn builder(urlconf: impl Into<Arc<RouteTable>>) -> DispatcherBuilder {
		DispatcherBuilder::new(urlconf.into())
	}

	/// Dispatches one request.
	///
	/// The root table is loaded once on entry and published into the request
	/// context as `Arc<RouteTable>`, so handlers can reverse URLs against the
	/// same configuration that resolved them.
	pub async fn handle(&self, request: Request) -> Response {
		let urlconf = self.urlconf.load_full();
		let method = request.method.clone();
		let path = request.path().to_string();
		request.context.insert(Arc::clone(&urlconf));

		let endpoint = RoutingEndpoint {
			urlconf: Arc::clone(&urlconf),
			renderer: self.renderer.clone(),
		};
		let run = self.chain.run(request, &endpoint);
		let result = match self.request_timeout {
			Some(limit) => match tokio::time::timeout(limit, run).await {
				Ok(result) => result,
				Err(_) => Err(Error::Timeout(limit.as_millis() as u64)),
			},
			None => run.await,
		};

		let response = match result {
			Ok(response) => response,
			Err(error) => self.error_response(&error, &urlconf),
		};
		tracing::debug!(%method, path = %path, status = response.status.as_u16(), "request dispatched");
		finalize(&method, response)
	}

	/// Dispatches `request` unless `signal` resolves first.
	///
	/// On cancellation the in-flight chain is dropped, which releases every
	/// resource it scoped, and the caller gets a 499 response.
	pub async fn handle_with_cancellation<F>(&self, request: Request, signal: F) -> Response
	where
		F: Future<Output = ()>,
	{
		let method = request.method.clone();
		let path = request.path().to_string();
		tokio::select! {
			response = self.handle(request) => response,
			_ = signal => {
				tracing::info!(%method, path = %path, "request cancelled by caller");
				let urlconf = self.urlconf.load();
				self.error_response(&Error::Cancelled, &urlconf)
			}
		}
	}

	/// Atomically replaces the root route table.
	///
	/// Requests already in flight finish against the table they started with.
	pub fn reload(&self, urlconf: impl Into<Arc<RouteTable>>) {
		let urlconf = urlconf.into();
		tracing::info!(routes = urlconf.routes().len(), "route table reloaded");
		self.urlconf.store(urlconf);
	}

	/// The current root route table.
	pub fn urlconf(&self) -> Arc<RouteTable> {
		self.urlconf.load_full()
	}

	pub fn middleware_chain(&self) -> &MiddlewareChain {
		&self.chain
	}

	pub fn is_debug(&self) -> bool {
		self.exceptions.debug()
	}

	pub fn request_timeout(&self) -> Option<Duration> {
		self.request_timeout
	}

	fn error_response(&self, error: &Error, urlconf: &RouteTable) -> Response {
		if self.exceptions.debug() && matches!(error, Error::NotFound(_)) {
			return self.exceptions.handle(error, &urlconf.routes());
		}
		self.exceptions.handle(error, &[])
	}
}

/// HEAD responses keep their headers and lose their body.
fn finalize(method: &Method, mut response: Response) -> Response {
	if method == Method::HEAD {
		response.body = Bytes::new();
	}
	response
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
	urlconf: Arc<RouteTable>,
	chain: MiddlewareChain,
	renderer: Option<Arc<dyn TemplateRenderer>>,
	debug: bool,
	request_timeout: Option<Duration>,
}

impl DispatcherBuilder {
	fn new(urlconf: Arc<RouteTable>) -> Self {
		Self {
			urlconf,
			chain: MiddlewareChain::new(),
			renderer: None,
			debug: false,
			request_timeout: None,
		}
	}

	/// Appends a middleware; the first one added is outermost.
	pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.chain.add_middleware(middleware);
		self
	}

	/// Replaces the whole chain.
	pub fn middleware_chain(mut self, chain: MiddlewareChain) -> Self {
		self.chain = chain;
		self
	}

	pub fn renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
		self.renderer = Some(renderer);
		self
	}

	pub fn debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);
		self
	}

	pub fn without_request_timeout(mut self) -> Self {
		self.request_timeout = None;
		self
	}

	/// Applies `settings`: debug flag, request timeout and the configured
	/// middleware, resolved through `registry` and appended in order.
	///
	/// # Errors
	///
	/// Returns [`Error::ImproperlyConfigured`] for invalid settings or a
	/// middleware identifier `registry` does not know.
	pub fn settings(mut self, settings: &Settings, registry: &MiddlewareRegistry) -> Result<Self> {
		settings.validate()?;
		for middleware in registry.build_chain(&settings.middleware)?.middlewares() {
			self.chain.add_middleware(Arc::clone(middleware));
		}
		self.debug = settings.debug;
		self.request_timeout = settings.request_timeout();
		Ok(self)
	}

	pub fn build(self) -> Dispatcher {
		tracing::debug!(
			routes = self.urlconf.routes().len(),
			middleware = self.chain.len(),
			debug = self.debug,
			"dispatcher ready"
		);
		Dispatcher {
			urlconf: Arc::new(ArcSwap::new(self.urlconf)),
			chain: Arc::new(self.chain),
			renderer: self.renderer,
			exceptions: ExceptionHandler::new(self.debug),
			request_timeout: self.request_timeout,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use grappelli_http::{Reply, handler_fn};
	use grappelli_urls::path;
	use rstest::rstest;
	use serde_json::json;

	fn table(body: &'static str) -> RouteTable {
		RouteTable::builder()
			.route(
				path("/version", handler_fn(move |_req| async move { Reply::json(&body) }))
					.unwrap()
					.with_name("version"),
			)
			.build()
			.unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_reload_swaps_table_for_all_clones() {
		let dispatcher = Dispatcher::builder(table("v1")).build();
		let clone = dispatcher.clone();

		clone.reload(table("v2"));

		let response = dispatcher
			.handle(Request::builder().uri("/version").build().unwrap())
			.await;
		assert_eq!(response.body_text(), r#""v2""#);
	}

	#[rstest]
	#[tokio::test]
	async fn test_head_body_is_dropped() {
		let dispatcher = Dispatcher::builder(table("v1")).build();
		let request = Request::builder()
			.method(Method::HEAD)
			.uri("/version")
			.build()
			.unwrap();

		let response = dispatcher.handle(request).await;

		assert_eq!(response.status.as_u16(), 200);
		assert_eq!(response.content_type(), Some("application/json"));
		assert!(response.body.is_empty());
	}

	#[rstest]
	fn test_settings_applied() {
		let settings = Settings {
			debug: true,
			request_timeout_ms: Some(250),
			middleware: vec![grappelli_conf::MiddlewareConfig::new(
				grappelli_middleware::LOGGING_MIDDLEWARE,
			)],
			..Settings::default()
		};

		let dispatcher = Dispatcher::builder(table("v1"))
			.settings(&settings, &MiddlewareRegistry::with_builtins())
			.unwrap()
			.build();

		assert!(dispatcher.is_debug());
		assert_eq!(dispatcher.request_timeout(), Some(Duration::from_millis(250)));
		assert_eq!(dispatcher.middleware_chain().len(), 1);
	}

	#[rstest]
	fn test_settings_with_unknown_middleware() {
		let settings = Settings {
			middleware: vec![grappelli_conf::MiddlewareConfig::new("app.Missing")
				.with_option("x", json!(1))],
			..Settings::default()
		};

		let result =
			Dispatcher::builder(table("v1")).settings(&settings, &MiddlewareRegistry::with_builtins());

		assert!(matches!(result, Err(Error::ImproperlyConfigured(_))));
	}
}
