//! Middleware chain.
//!
//! A [`Middleware`] wraps everything after it. Its `process` method runs the
//! pre-phase, hands the request on with [`Next::run`], then runs the
//! post-phase on the response coming back:
//!
//! ```rust
//! use grappelli_http::{Middleware, Next, Request, Response};
//! use async_trait::async_trait;
//!
//! struct PoweredBy;
//!
//! #[async_trait]
//! impl Middleware for PoweredBy {
//!     async fn process(&self, request: Request, next: Next<'_>) -> grappelli_core::Result<Response> {
//!         let response = next.run(request).await?;
//!         Ok(response.with_header("X-Powered-By", "grappelli"))
//!     }
//! }
//! ```
//!
//! `Next::run` takes `next` by value, so a middleware can continue the chain
//! at most once. Returning without calling it short-circuits every inner
//! layer.
//!
//! The chain is an ordered slice walked by [`Next`]; each call advances one
//! position. The first middleware added is the outermost.

use async_trait::async_trait;
use grappelli_core::exception::{Error, Result};
use std::sync::Arc;

use crate::{Request, Response};

/// The innermost step of a chain: turns a request into a response.
///
/// The dispatcher's endpoint resolves the route and invokes the handler.
#[async_trait]
pub trait Endpoint: Send + Sync {
	async fn call(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T: Endpoint + ?Sized> Endpoint for Arc<T> {
	async fn call(&self, request: Request) -> Result<Response> {
		(**self).call(request).await
	}
}

/// A unit of cross-cutting request processing.
#[async_trait]
pub trait Middleware: Send + Sync {
	/// Processes a request, usually by calling `next.run(request)` between a
	/// pre-phase and a post-phase.
	///
	/// # Errors
	///
	/// Errors from this middleware or from inner layers propagate outward.
	async fn process(&self, request: Request, next: Next<'_>) -> Result<Response>;

	/// Called with any error leaving [`process`](Self::process), including
	/// errors raised by inner layers.
	///
	/// Returning `Ok` recovers with that response; the default re-raises.
	async fn process_error(&self, error: Error) -> Result<Response> {
		Err(error)
	}

	/// Whether this middleware takes part in handling `request`.
	///
	/// Skipped middleware runs neither phase. Defaults to `true`.
	fn should_continue(&self, _request: &Request) -> bool {
		true
	}

	/// Name used in log output.
	fn name(&self) -> &str {
		std::any::type_name::<Self>()
	}
}

/// The remainder of a chain, from the point of view of one middleware.
pub struct Next<'a> {
	middlewares: &'a [Arc<dyn Middleware>],
	endpoint: &'a dyn Endpoint,
}

impl<'a> Next<'a> {
	/// Creates the entry point of a chain over `middlewares` ending in `endpoint`.
	pub fn new(middlewares: &'a [Arc<dyn Middleware>], endpoint: &'a dyn Endpoint) -> Self {
		Self {
			middlewares,
			endpoint,
		}
	}

	/// Number of middleware still ahead, before any are skipped.
	pub fn remaining(&self) -> usize {
		self.middlewares.len()
	}

	/// Passes `request` to the next participating middleware, or to the
	/// endpoint when none is left.
	pub async fn run(self, request: Request) -> Result<Response> {
		let mut remaining = self.middlewares;
		while let Some((current, rest)) = remaining.split_first() {
			if !current.should_continue(&request) {
				tracing::trace!(middleware = current.name(), "middleware skipped");
				remaining = rest;
				continue;
			}

			let next = Next {
				middlewares: rest,
				endpoint: self.endpoint,
			};
			return match current.process(request, next).await {
				Ok(response) => Ok(response),
				Err(error) => current.process_error(error).await,
			};
		}

		self.endpoint.call(request).await
	}
}

/// Ordered list of middleware, fixed once built.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
	middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a middleware inside the ones already added.
	///
	/// # Examples
	///
	/// ```rust
	/// use grappelli_http::{Middleware, MiddlewareChain, Next, Request, Response};
	/// use std::sync::Arc;
	///
	/// # struct Outer;
	/// # struct Inner;
	/// # #[async_trait::async_trait]
	/// # impl Middleware for Outer {
	/// #     async fn process(&self, request: Request, next: Next<'_>) -> grappelli_core::Result<Response> {
	/// #         next.run(request).await
	/// #     }
	/// # }
	/// # #[async_trait::async_trait]
	/// # impl Middleware for Inner {
	/// #     async fn process(&self, request: Request, next: Next<'_>) -> grappelli_core::Result<Response> {
	/// #         next.run(request).await
	/// #     }
	/// # }
	/// let chain = MiddlewareChain::new()
	///     .with_middleware(Arc::new(Outer))
	///     .with_middleware(Arc::new(Inner));
	/// assert_eq!(chain.len(), 2);
	/// ```
	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
		self.middlewares.push(middleware);
	}

	pub fn len(&self) -> usize {
		self.middlewares.len()
	}

	pub fn is_empty(&self) -> bool {
		self.middlewares.is_empty()
	}

	/// Middleware in order, outermost first.
	pub fn middlewares(&self) -> &[Arc<dyn Middleware>] {
		&self.middlewares
	}

	/// Runs `request` through the chain, ending in `endpoint`.
	pub async fn run(&self, request: Request, endpoint: &dyn Endpoint) -> Result<Response> {
		Next::new(&self.middlewares, endpoint).run(request).await
	}

	/// Binds the chain to a fixed endpoint.
	pub fn build(self, endpoint: Arc<dyn Endpoint>) -> Arc<dyn Endpoint> {
		Arc::new(ChainedEndpoint {
			chain: self,
			endpoint,
		})
	}
}

impl FromIterator<Arc<dyn Middleware>> for MiddlewareChain {
	fn from_iter<I: IntoIterator<Item = Arc<dyn Middleware>>>(iter: I) -> Self {
		Self {
			middlewares: iter.into_iter().collect(),
		}
	}
}

struct ChainedEndpoint {
	chain: MiddlewareChain,
	endpoint: Arc<dyn Endpoint>,
}

#[async_trait]
impl Endpoint for ChainedEndpoint {
	async fn call(&self, request: Request) -> Result<Response> {
		self.chain.run(request, self.endpoint.as_ref()).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::StatusCode;
	use rstest::rstest;
	use std::sync::Mutex;

	type Trace = Arc<Mutex<Vec<String>>>;

	struct RecordingEndpoint {
		trace: Trace,
	}

	#[async_trait]
	impl Endpoint for RecordingEndpoint {
		async fn call(&self, _request: Request) -> Result<Response> {
			self.trace.lock().unwrap().push("H".to_string());
			Ok(Response::ok().with_body("handler"))
		}
	}

	struct Recording {
		label: &'static str,
		trace: Trace,
	}

	#[async_trait]
	impl Middleware for Recording {
		async fn process(&self, request: Request, next: Next<'_>) -> Result<Response> {
			self.trace.lock().unwrap().push(format!("{}-pre", self.label));
			let response = next.run(request).await?;
			self.trace.lock().unwrap().push(format!("{}-post", self.label));
			Ok(response)
		}
	}

	struct Deny;

	#[async_trait]
	impl Middleware for Deny {
		async fn process(&self, _request: Request, _next: Next<'_>) -> Result<Response> {
			Ok(Response::unauthorized().with_body("Auth required"))
		}
	}

	struct ApiOnly {
		trace: Trace,
	}

	#[async_trait]
	impl Middleware for ApiOnly {
		async fn process(&self, request: Request, next: Next<'_>) -> Result<Response> {
			self.trace.lock().unwrap().push("api".to_string());
			next.run(request).await
		}

		fn should_continue(&self, request: &Request) -> bool {
			request.path().starts_with("/api/")
		}
	}

	struct Fails;

	#[async_trait]
	impl Middleware for Fails {
		async fn process(&self, _request: Request, _next: Next<'_>) -> Result<Response> {
			Err(Error::Middleware("exploded".to_string()))
		}
	}

	struct Recovers;

	#[async_trait]
	impl Middleware for Recovers {
		async fn process(&self, request: Request, next: Next<'_>) -> Result<Response> {
			next.run(request).await
		}

		async fn process_error(&self, error: Error) -> Result<Response> {
			Ok(Response::service_unavailable().with_body(error.to_string()))
		}
	}

	fn request(path: &str) -> Request {
		Request::builder().uri(path).build().unwrap()
	}

	fn recorded(trace: &Trace) -> Vec<String> {
		trace.lock().unwrap().clone()
	}

	#[rstest]
	#[tokio::test]
	async fn test_empty_chain_calls_endpoint() {
		let trace = Trace::default();
		let endpoint = RecordingEndpoint {
			trace: trace.clone(),
		};

		let response = MiddlewareChain::new()
			.run(request("/"), &endpoint)
			.await
			.unwrap();

		assert_eq!(response.body_text(), "handler");
		assert_eq!(recorded(&trace), vec!["H"]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_phases_nest_in_declared_order() {
		let trace = Trace::default();
		let chain = MiddlewareChain::new()
			.with_middleware(Arc::new(Recording {
				label: "M1",
				trace: trace.clone(),
			}))
			.with_middleware(Arc::new(Recording {
				label: "M2",
				trace: trace.clone(),
			}));
		let endpoint = RecordingEndpoint {
			trace: trace.clone(),
		};

		chain.run(request("/"), &endpoint).await.unwrap();

		assert_eq!(
			recorded(&trace),
			vec!["M1-pre", "M2-pre", "H", "M2-post", "M1-post"]
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_short_circuit_skips_inner_layers() {
		let trace = Trace::default();
		let chain = MiddlewareChain::new()
			.with_middleware(Arc::new(Deny))
			.with_middleware(Arc::new(Recording {
				label: "M2",
				trace: trace.clone(),
			}));
		let endpoint = RecordingEndpoint {
			trace: trace.clone(),
		};

		let response = chain.run(request("/"), &endpoint).await.unwrap();

		assert_eq!(response.status, StatusCode::UNAUTHORIZED);
		assert_eq!(response.body_text(), "Auth required");
		assert!(recorded(&trace).is_empty());
	}

	#[rstest]
	#[case("/api/users", vec!["api", "H"])]
	#[case("/public", vec!["H"])]
	#[tokio::test]
	async fn test_should_continue_skips_both_phases(
		#[case] path: &str,
		#[case] expected: Vec<&str>,
	) {
		let trace = Trace::default();
		let chain = MiddlewareChain::new().with_middleware(Arc::new(ApiOnly {
			trace: trace.clone(),
		}));
		let endpoint = RecordingEndpoint {
			trace: trace.clone(),
		};

		chain.run(request(path), &endpoint).await.unwrap();

		assert_eq!(recorded(&trace), expected);
	}

	#[rstest]
	#[tokio::test]
	async fn test_error_skips_post_phase_of_outer_layers() {
		let trace = Trace::default();
		let chain = MiddlewareChain::new()
			.with_middleware(Arc::new(Recording {
				label: "M1",
				trace: trace.clone(),
			}))
			.with_middleware(Arc::new(Fails));
		let endpoint = RecordingEndpoint {
			trace: trace.clone(),
		};

		let result = chain.run(request("/"), &endpoint).await;

		assert!(matches!(result, Err(Error::Middleware(_))));
		assert_eq!(recorded(&trace), vec!["M1-pre"]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_process_error_hook_recovers() {
		let trace = Trace::default();
		let chain = MiddlewareChain::new()
			.with_middleware(Arc::new(Recovers))
			.with_middleware(Arc::new(Fails));
		let endpoint = RecordingEndpoint {
			trace: trace.clone(),
		};

		let response = chain.run(request("/"), &endpoint).await.unwrap();

		assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
		assert_eq!(response.body_text(), "Middleware error: exploded");
	}

	#[rstest]
	#[tokio::test]
	async fn test_build_binds_endpoint() {
		let trace = Trace::default();
		let endpoint: Arc<dyn Endpoint> = Arc::new(RecordingEndpoint {
			trace: trace.clone(),
		});
		let composed = MiddlewareChain::new()
			.with_middleware(Arc::new(Recording {
				label: "M1",
				trace: trace.clone(),
			}))
			.build(endpoint);

		composed.call(request("/")).await.unwrap();
		composed.call(request("/")).await.unwrap();

		assert_eq!(
			recorded(&trace),
			vec!["M1-pre", "H", "M1-post", "M1-pre", "H", "M1-post"]
		);
	}
}
