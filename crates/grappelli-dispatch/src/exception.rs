//! Error to response conversion.
//!
//! Every error that escapes the middleware chain ends up here. Client errors
//! get a small JSON body describing what went wrong; server errors only
//! reveal their message when debug mode is on.

use grappelli_core::exception::{CLIENT_CLOSED_REQUEST, Error};
use grappelli_http::{Method, Response, StatusCode};
use grappelli_urls::RouteInfo;
use serde_json::{Value, json};

/// Converts errors into responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionHandler {
	debug: bool,
}

impl ExceptionHandler {
	pub fn new(debug: bool) -> Self {
		Self { debug }
	}

	pub fn debug(&self) -> bool {
		self.debug
	}

	/// Builds the response for `error`, logging it on the way.
	///
	/// `tried` lists the routes of the table the request was resolved
	/// against; it is only rendered into debug-mode 404 bodies.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_core::Error;
	/// use grappelli_dispatch::ExceptionHandler;
	///
	/// let handler = ExceptionHandler::new(false);
	/// let response = handler.handle(&Error::Internal("db password is hunter2".into()), &[]);
	/// assert_eq!(response.status.as_u16(), 500);
	/// assert!(!response.body_text().contains("hunter2"));
	/// ```
	pub fn handle(&self, error: &Error, tried: &[RouteInfo]) -> Response {
		let status = status_for(error);
		log_error(error, status);

		let detail = if status.is_server_error() && !self.debug {
			reason(status).to_string()
		} else {
			error.to_string()
		};
		let mut body = json!({
			"status": status.as_u16(),
			"error": reason(status),
			"detail": detail,
		});
		if self.debug && matches!(error, Error::NotFound(_)) {
			body["tried"] = Value::Array(tried.iter().map(describe_route).collect());
		}

		let response = match error.allowed_methods() {
			Some(allowed) => Response::method_not_allowed(allowed),
			None => Response::new(status),
		};
		match response.clone().with_json(&body) {
			Ok(response) => response,
			// A json! value always serializes; keep the status if it somehow does not
			Err(_) => response,
		}
	}
}

/// Converts `error` into a response with the given debug setting.
pub fn convert_exception_to_response(error: &Error, debug: bool) -> Response {
	ExceptionHandler::new(debug).handle(error, &[])
}

fn status_for(error: &Error) -> StatusCode {
	StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn reason(status: StatusCode) -> &'static str {
	if status.as_u16() == CLIENT_CLOSED_REQUEST {
		return "Client Closed Request";
	}
	status.canonical_reason().unwrap_or("Unknown")
}

fn describe_route(route: &RouteInfo) -> Value {
	let methods = route.methods.as_ref().map(|methods| {
		methods
			.iter()
			.map(Method::as_str)
			.map(String::from)
			.collect::<Vec<_>>()
	});
	json!({
		"pattern": route.pattern,
		"name": route.name,
		"methods": methods,
	})
}

fn log_error(error: &Error, status: StatusCode) {
	let code = status.as_u16();
	match error {
		Error::NotFound(_) | Error::MethodNotAllowed { .. } | Error::Cancelled => {
			tracing::debug!(status = code, error = %error, "request rejected");
		}
		_ if status.is_client_error() => {
			tracing::warn!(status = code, error = %error, "request rejected");
		}
		_ => {
			tracing::error!(status = code, error = %error, "request failed");
		}
	}
}
