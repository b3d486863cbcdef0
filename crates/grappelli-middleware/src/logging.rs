//! Request logging middleware.

use async_trait::async_trait;
use grappelli_core::exception::Result;
use grappelli_http::{Middleware, Next, Request, Response};
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Options for [`LoggingMiddleware`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// Requests slower than this are logged at `warn`.
	pub slow_request_ms: Option<u64>,
}

/// Logs one event per request with method, path, status and latency.
///
/// # Examples
///
/// ```
/// use grappelli_http::{Endpoint, MiddlewareChain, Request, Response};
/// use grappelli_middleware::LoggingMiddleware;
/// use std::sync::Arc;
///
/// struct Ok200;
///
/// #[async_trait::async_trait]
/// impl Endpoint for Ok200 {
///     async fn call(&self, _request: Request) -> grappelli_core::Result<Response> {
///         Ok(Response::ok())
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let chain = MiddlewareChain::new().with_middleware(Arc::new(LoggingMiddleware::new()));
/// let request = Request::builder().uri("/api/users").build().unwrap();
/// let response = chain.run(request, &Ok200).await.unwrap();
/// assert_eq!(response.status.as_u16(), 200);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
	config: LoggingConfig,
}

impl LoggingMiddleware {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_config(config: LoggingConfig) -> Self {
		Self { config }
	}

	fn is_slow(&self, elapsed: Duration) -> bool {
		self.config
			.slow_request_ms
			.is_some_and(|threshold| elapsed >= Duration::from_millis(threshold))
	}
}

#[async_trait]
impl Middleware for LoggingMiddleware {
	async fn process(&self, request: Request, next: Next<'_>) -> Result<Response> {
		let start = Instant::now();
		let method = request.method.clone();
		let path = request.path().to_string();

		let result = next.run(request).await;

		let elapsed = start.elapsed();
		let latency_ms = elapsed.as_millis() as u64;
		match &result {
			Ok(response) if response.status.is_server_error() => {
				tracing::error!(%method, %path, status = response.status.as_u16(), latency_ms, "request failed");
			}
			Ok(response) if self.is_slow(elapsed) => {
				tracing::warn!(%method, %path, status = response.status.as_u16(), latency_ms, "slow request");
			}
			Ok(response) => {
				tracing::info!(%method, %path, status = response.status.as_u16(), latency_ms, "request handled");
			}
			Err(error) => {
				tracing::warn!(%method, %path, status = error.status_code(), latency_ms, %error, "request raised");
			}
		}

		result
	}

	fn name(&self) -> &str {
		"LoggingMiddleware"
	}
}
