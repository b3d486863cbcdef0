//! Incoming request model.

mod body;

pub use body::RequestBody;

use crate::context::Context;
use crate::params::{ParamValue, PathParams};
use crate::query::QueryParams;
use crate::resolver_match::ResolverMatch;
use bytes::Bytes;
use grappelli_core::exception::{Error, Result};
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Uri, Version};

/// HTTP request as seen by middleware and handlers.
///
/// Header lookups are case-insensitive. `path_params` and `resolver_match`
/// are empty until the dispatcher resolves the request.
#[derive(Debug)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: RequestBody,
	pub query_params: QueryParams,
	pub path_params: PathParams,
	pub context: Context,
	pub resolver_match: Option<ResolverMatch>,
}

impl Request {
	/// Starts building a request.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::{Method, Request};
	///
	/// let request = Request::builder()
	///     .method(Method::POST)
	///     .uri("/api/users?page=2")
	///     .header("Content-Type", "application/json")
	///     .body(r#"{"name":"alice"}"#)
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.path(), "/api/users");
	/// assert_eq!(request.query_params.get("page"), Some("2"));
	/// assert_eq!(request.header("content-type"), Some("application/json"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Request path, without the query string.
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Raw query string, if any.
	pub fn query_string(&self) -> Option<&str> {
		self.uri.query()
	}

	/// Header value as a string; `None` when absent or not visible ASCII.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// A resolved path parameter.
	pub fn path_param(&self, name: &str) -> Option<&ParamValue> {
		self.path_params.get(name)
	}

	/// Replaces the path parameters (used by the dispatcher after resolution).
	pub fn set_path_params(&mut self, params: PathParams) {
		self.path_params = params;
	}

	/// Deserializes the body as JSON.
	///
	/// # Errors
	///
	/// Returns [`Error::Validation`] if the body is not valid JSON for `T`.
	pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
		self.body.json()
	}
}

/// Builder for [`Request`].
#[derive(Debug)]
pub struct RequestBuilder {
	method: Method,
	uri: String,
	version: Version,
	headers: HeaderMap,
	body: RequestBody,
	error: Option<Error>,
}

impl Default for RequestBuilder {
	fn default() -> Self {
		Self {
			method: Method::GET,
			uri: "/".to_string(),
			version: Version::HTTP_11,
			headers: HeaderMap::new(),
			body: RequestBody::default(),
			error: None,
		}
	}
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = uri.into();
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = version;
		self
	}

	/// Replaces all headers.
	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Appends a header. An invalid name or value fails [`build`](Self::build).
	pub fn header(mut self, name: &str, value: &str) -> Self {
		match (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			(Ok(name), Ok(value)) => {
				self.headers.append(name, value);
			}
			_ => {
				self.error
					.get_or_insert_with(|| Error::Validation(format!("invalid header '{}'", name)));
			}
		}
		self
	}

	/// Sets a raw body.
	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = RequestBody::Raw(body.into());
		self
	}

	/// Sets an already-decoded JSON body.
	pub fn json(mut self, value: serde_json::Value) -> Self {
		self.body = RequestBody::Json(value);
		self
	}

	/// Builds the request.
	///
	/// # Errors
	///
	/// Returns [`Error::Validation`] when the URI or a header is invalid.
	pub fn build(self) -> Result<Request> {
		if let Some(error) = self.error {
			return Err(error);
		}
		let uri: Uri = self
			.uri
			.parse()
			.map_err(|e| Error::Validation(format!("invalid URI '{}': {}", self.uri, e)))?;
		let query_params = uri.query().map(QueryParams::parse).unwrap_or_default();

		Ok(Request {
			method: self.method,
			uri,
			version: self.version,
			headers: self.headers,
			body: self.body,
			query_params,
			path_params: PathParams::new(),
			context: Context::new(),
			resolver_match: None,
		})
	}
}
