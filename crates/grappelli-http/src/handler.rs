//! Handlers and their return values.

use crate::{Request, Response};
use async_trait::async_trait;
use grappelli_core::exception::{Error, Result};
use hyper::StatusCode;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// What a handler produces.
///
/// The dispatcher turns each variant into a [`Response`]: JSON payloads are
/// serialized, templates go through the configured
/// [`TemplateRenderer`](crate::TemplateRenderer), and prebuilt responses pass
/// through unchanged.
#[derive(Debug)]
pub enum Reply {
	Json {
		status: StatusCode,
		payload: serde_json::Value,
	},
	Template {
		status: StatusCode,
		name: String,
		context: serde_json::Value,
	},
	Response(Response),
}

impl Reply {
	/// A `200 OK` JSON reply.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::Reply;
	///
	/// let reply = Reply::json(&serde_json::json!({"id": 1})).unwrap();
	/// assert!(matches!(reply, Reply::Json { .. }));
	/// ```
	pub fn json<T: Serialize + ?Sized>(payload: &T) -> Result<Self> {
		Ok(Reply::Json {
			status: StatusCode::OK,
			payload: serde_json::to_value(payload)?,
		})
	}

	/// A `200 OK` template reply.
	pub fn template(name: impl Into<String>, context: serde_json::Value) -> Self {
		Reply::Template {
			status: StatusCode::OK,
			name: name.into(),
			context,
		}
	}

	/// Overrides the status code.
	pub fn with_status(mut self, new_status: StatusCode) -> Self {
		match &mut self {
			Reply::Json { status, .. } | Reply::Template { status, .. } => *status = new_status,
			Reply::Response(response) => response.status = new_status,
		}
		self
	}

	pub fn status(&self) -> StatusCode {
		match self {
			Reply::Json { status, .. } | Reply::Template { status, .. } => *status,
			Reply::Response(response) => response.status,
		}
	}
}

impl From<Response> for Reply {
	fn from(response: Response) -> Self {
		Reply::Response(response)
	}
}

/// Application code bound to a route.
///
/// Handlers receive the request with its path parameters already populated.
#[async_trait]
pub trait Handler: Send + Sync {
	/// # Errors
	///
	/// Errors propagate outward through the middleware chain and are turned
	/// into an error response by the dispatcher.
	async fn handle(&self, request: Request) -> Result<Reply>;
}

#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Reply> {
		(**self).handle(request).await
	}
}

/// Adapts an async function into a [`Handler`].
pub struct FunctionHandler<F> {
	func: F,
}

/// Wraps an async function or closure as a handler.
///
/// # Examples
///
/// ```
/// use grappelli_http::{Handler, Reply, Request, Response, handler_fn};
///
/// let handler = handler_fn(|request: Request| async move {
///     Ok(Response::ok().with_body(request.path().to_string()))
/// });
/// # tokio_test::block_on(async {
/// let request = Request::builder().uri("/ping").build().unwrap();
/// match handler.handle(request).await.unwrap() {
///     Reply::Response(response) => assert_eq!(response.body_text(), "/ping"),
///     other => panic!("unexpected reply {:?}", other),
/// }
/// # });
/// ```
pub fn handler_fn<F, Fut, R>(func: F) -> FunctionHandler<F>
where
	F: Fn(Request) -> Fut + Send + Sync,
	Fut: Future<Output = Result<R>> + Send,
	R: Into<Reply> + Send,
{
	FunctionHandler { func }
}

#[async_trait]
impl<F, Fut, R> Handler for FunctionHandler<F>
where
	F: Fn(Request) -> Fut + Send + Sync,
	Fut: Future<Output = Result<R>> + Send,
	R: Into<Reply> + Send,
{
	async fn handle(&self, request: Request) -> Result<Reply> {
		(self.func)(request).await.map(Into::into)
	}
}

/// Adapts a synchronous, possibly blocking, function into a [`Handler`].
///
/// The function runs on tokio's blocking thread pool so it never stalls the
/// async workers.
pub struct BlockingHandler<F> {
	func: Arc<F>,
}

/// Wraps a blocking function as a handler.
pub fn blocking_fn<F, R>(func: F) -> BlockingHandler<F>
where
	F: Fn(Request) -> Result<R> + Send + Sync + 'static,
	R: Into<Reply> + Send + 'static,
{
	BlockingHandler {
		func: Arc::new(func),
	}
}

#[async_trait]
impl<F, R> Handler for BlockingHandler<F>
where
	F: Fn(Request) -> Result<R> + Send + Sync + 'static,
	R: Into<Reply> + Send + 'static,
{
	async fn handle(&self, request: Request) -> Result<Reply> {
		let func = Arc::clone(&self.func);
		let outcome = tokio::task::spawn_blocking(move || (*func)(request))
			.await
			.map_err(|e| Error::Internal(format!("blocking handler failed: {}", e)))?;
		outcome.map(Into::into)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn request(path: &str) -> Request {
		Request::builder().uri(path).build().unwrap()
	}

	#[rstest]
	fn test_with_status_applies_to_every_variant() {
		let json = Reply::json(&serde_json::json!({})).unwrap();
		let template = Reply::template("page.html", serde_json::Value::Null);
		let response = Reply::from(Response::ok());

		assert_eq!(json.with_status(StatusCode::CREATED).status(), StatusCode::CREATED);
		assert_eq!(
			template.with_status(StatusCode::ACCEPTED).status(),
			StatusCode::ACCEPTED
		);
		assert_eq!(
			response.with_status(StatusCode::IM_A_TEAPOT).status(),
			StatusCode::IM_A_TEAPOT
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_function_handler_receives_request() {
		let handler = handler_fn(|req: Request| async move {
			Reply::json(&serde_json::json!({ "path": req.path() }))
		});

		let reply = handler.handle(request("/hello")).await.unwrap();

		match reply {
			Reply::Json { payload, status } => {
				assert_eq!(status, StatusCode::OK);
				assert_eq!(payload["path"], "/hello");
			}
			other => panic!("unexpected reply: {:?}", other),
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_blocking_handler_runs_off_the_async_workers() {
		let handler = blocking_fn(|req: Request| {
			std::thread::sleep(std::time::Duration::from_millis(5));
			Ok(Response::ok().with_body(req.path().to_string()))
		});

		let reply = handler.handle(request("/slow")).await.unwrap();

		match reply {
			Reply::Response(response) => assert_eq!(response.body_text(), "/slow"),
			other => panic!("unexpected reply: {:?}", other),
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_handler_errors_propagate() {
		let handler = handler_fn(|_req: Request| async move {
			Err::<Response, _>(Error::Authorization("staff only".into()))
		});

		let result = handler.handle(request("/admin")).await;

		assert!(matches!(result, Err(Error::Authorization(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_arc_handler_delegates() {
		let handler: Arc<dyn Handler> = Arc::new(handler_fn(|_req: Request| async move {
			Ok(Response::no_content())
		}));

		let reply = handler.handle(request("/")).await.unwrap();
		assert_eq!(reply.status(), StatusCode::NO_CONTENT);
	}
}
