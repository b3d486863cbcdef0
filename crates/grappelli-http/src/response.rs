use bytes::Bytes;
use grappelli_core::exception::Result;
use hyper::header::{self, HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, StatusCode};
use serde::Serialize;

/// HTTP response representation.
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::{Response, StatusCode};
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn created() -> Self {
		Self::new(StatusCode::CREATED)
	}

	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT)
	}

	pub fn bad_request() -> Self {
		Self::new(StatusCode::BAD_REQUEST)
	}

	pub fn unauthorized() -> Self {
		Self::new(StatusCode::UNAUTHORIZED)
	}

	pub fn forbidden() -> Self {
		Self::new(StatusCode::FORBIDDEN)
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	/// Create a 405 response advertising the accepted methods in `Allow`
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::{Method, Response, StatusCode};
	///
	/// let response = Response::method_not_allowed(&[Method::GET, Method::POST]);
	/// assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
	/// assert_eq!(response.headers.get("allow").unwrap(), "GET, POST");
	/// ```
	pub fn method_not_allowed(allowed: &[Method]) -> Self {
		let allow = allowed
			.iter()
			.map(Method::as_str)
			.collect::<Vec<_>>()
			.join(", ");
		Self::new(StatusCode::METHOD_NOT_ALLOWED).with_header(header::ALLOW.as_str(), &allow)
	}

	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	pub fn service_unavailable() -> Self {
		Self::new(StatusCode::SERVICE_UNAVAILABLE)
	}

	/// Create a Response with HTTP 302 Found (temporary redirect)
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::{Response, StatusCode};
	///
	/// let response = Response::temporary_redirect("/login");
	/// assert_eq!(response.status, StatusCode::FOUND);
	/// assert_eq!(response.headers.get("location").unwrap(), "/login");
	/// ```
	pub fn temporary_redirect(location: impl AsRef<str>) -> Self {
		Self::new(StatusCode::FOUND).with_location(location.as_ref())
	}

	pub fn permanent_redirect(location: impl AsRef<str>) -> Self {
		Self::new(StatusCode::MOVED_PERMANENTLY).with_location(location.as_ref())
	}

	pub fn with_status(mut self, status: StatusCode) -> Self {
		self.status = status;
		self
	}

	/// Set the response body
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Add a custom header to the response
	///
	/// Invalid header names or values are ignored.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::Response;
	///
	/// let response = Response::ok().with_header("X-Custom-Header", "custom-value");
	/// assert_eq!(response.headers.get("x-custom-header").unwrap(), "custom-value");
	/// ```
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	pub fn with_typed_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);
		self
	}

	pub fn with_location(self, location: &str) -> Self {
		self.with_header(header::LOCATION.as_str(), location)
	}

	/// Set the response body to JSON and add the matching Content-Type header
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::Response;
	/// use serde_json::json;
	///
	/// let response = Response::ok().with_json(&json!({"message": "hi"})).unwrap();
	/// assert_eq!(response.content_type(), Some("application/json"));
	/// assert_eq!(response.body_text(), r#"{"message":"hi"}"#);
	/// ```
	pub fn with_json<T: Serialize>(mut self, data: &T) -> Result<Self> {
		self.body = Bytes::from(serde_json::to_vec(data)?);
		self.headers.insert(
			header::CONTENT_TYPE,
			HeaderValue::from_static("application/json"),
		);
		Ok(self)
	}

	/// Set an HTML body with a `text/html; charset=utf-8` Content-Type.
	pub fn with_html(mut self, html: impl Into<String>) -> Self {
		self.body = Bytes::from(html.into());
		self.headers.insert(
			header::CONTENT_TYPE,
			HeaderValue::from_static("text/html; charset=utf-8"),
		);
		self
	}

	pub fn content_type(&self) -> Option<&str> {
		self.headers
			.get(header::CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
	}

	/// Body decoded as UTF-8, lossily.
	pub fn body_text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}
}

impl Default for Response {
	fn default() -> Self {
		Self::ok()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Response::ok(), StatusCode::OK)]
	#[case(Response::created(), StatusCode::CREATED)]
	#[case(Response::no_content(), StatusCode::NO_CONTENT)]
	#[case(Response::unauthorized(), StatusCode::UNAUTHORIZED)]
	#[case(Response::forbidden(), StatusCode::FORBIDDEN)]
	#[case(Response::not_found(), StatusCode::NOT_FOUND)]
	#[case(Response::service_unavailable(), StatusCode::SERVICE_UNAVAILABLE)]
	fn test_status_constructors(#[case] response: Response, #[case] expected: StatusCode) {
		assert_eq!(response.status, expected);
		assert!(response.body.is_empty());
	}

	#[rstest]
	fn test_invalid_header_is_ignored() {
		let response = Response::ok().with_header("bad header", "value");
		assert!(response.headers.is_empty());
	}

	#[rstest]
	fn test_html_body() {
		let response = Response::ok().with_html("<p>hi</p>");
		assert_eq!(response.content_type(), Some("text/html; charset=utf-8"));
		assert_eq!(response.body_text(), "<p>hi</p>");
	}

	#[rstest]
	fn test_method_not_allowed_single_method() {
		let response = Response::method_not_allowed(&[Method::DELETE]);
		assert_eq!(response.headers.get(header::ALLOW).unwrap(), "DELETE");
	}
}
