//! Error taxonomy for routing, dispatch and middleware.
//!
//! Route matching itself never fails with an error: a path that matches
//! nothing is reported as a value by the route table. The variants here
//! cover failures that have to travel outward through the middleware chain
//! until the dispatcher turns them into a response.

use hyper::Method;
use thiserror::Error;

/// Result type used throughout Grappelli.
pub type Result<T> = std::result::Result<T, Error>;

/// Status used when the caller disconnected before a response was produced.
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Errors that can occur while building routes or dispatching a request.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
	/// A path pattern could not be compiled.
	#[error("Invalid path pattern '{pattern}': {reason}")]
	PatternSyntax { pattern: String, reason: String },

	/// No route matched the request path.
	#[error("Not found: {0}")]
	NotFound(String),

	/// A route matched the path but not the method.
	#[error("Method {method} not allowed for {path}")]
	MethodNotAllowed {
		method: Method,
		path: String,
		allowed: Vec<Method>,
	},

	/// A named route could not be turned back into a URL.
	#[error("Reverse lookup failed: {0}")]
	ReverseLookup(String),

	/// The application wiring is invalid (duplicate names, unknown middleware,
	/// missing template renderer, ...).
	#[error("Improperly configured: {0}")]
	ImproperlyConfigured(String),

	/// A middleware failed while processing the request.
	#[error("Middleware error: {0}")]
	Middleware(String),

	/// The request carries no valid credentials.
	#[error("Authentication required: {0}")]
	Authentication(String),

	/// The caller is authenticated but not permitted.
	#[error("Permission denied: {0}")]
	Authorization(String),

	/// The request itself is malformed.
	#[error("Validation error: {0}")]
	Validation(String),

	/// A payload could not be serialized or deserialized.
	#[error("Serialization error: {0}")]
	Serialization(String),

	/// The template collaborator failed.
	#[error("Template error: {0}")]
	Template(String),

	/// The unit of work was abandoned because the caller went away.
	#[error("Request cancelled")]
	Cancelled,

	/// The unit of work exceeded its deadline.
	#[error("Request timed out after {0} ms")]
	Timeout(u64),

	/// Internal failure.
	#[error("Internal error: {0}")]
	Internal(String),

	/// Any other error raised by application code.
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl Error {
	/// Builds a [`Error::PatternSyntax`] error.
	pub fn pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::PatternSyntax {
			pattern: pattern.into(),
			reason: reason.into(),
		}
	}

	/// Returns the HTTP status code this error maps to.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_core::exception::Error;
	///
	/// assert_eq!(Error::Authentication("no token".into()).status_code(), 401);
	/// assert_eq!(Error::Internal("boom".into()).status_code(), 500);
	/// ```
	pub fn status_code(&self) -> u16 {
		match self {
			Error::NotFound(_) => 404,
			Error::MethodNotAllowed { .. } => 405,
			Error::Authentication(_) => 401,
			Error::Authorization(_) => 403,
			Error::Validation(_) => 400,
			Error::Cancelled => CLIENT_CLOSED_REQUEST,
			Error::Timeout(_) => 503,
			Error::PatternSyntax { .. }
			| Error::ReverseLookup(_)
			| Error::ImproperlyConfigured(_)
			| Error::Middleware(_)
			| Error::Serialization(_)
			| Error::Template(_)
			| Error::Internal(_)
			| Error::Other(_) => 500,
		}
	}

	/// Whether the error is the caller's fault (4xx).
	pub fn is_client_error(&self) -> bool {
		(400..500).contains(&self.status_code())
	}

	/// Methods accepted by the matched path, for [`Error::MethodNotAllowed`].
	pub fn allowed_methods(&self) -> Option<&[Method]> {
		match self {
			Error::MethodNotAllowed { allowed, .. } => Some(allowed),
			_ => None,
		}
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Serialization(err.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Error::NotFound("/x".into()), 404)]
	#[case(Error::MethodNotAllowed { method: Method::POST, path: "/x".into(), allowed: vec![Method::GET] }, 405)]
	#[case(Error::Authentication("missing".into()), 401)]
	#[case(Error::Authorization("denied".into()), 403)]
	#[case(Error::Validation("bad".into()), 400)]
	#[case(Error::Cancelled, 499)]
	#[case(Error::Timeout(30), 503)]
	#[case(Error::ReverseLookup("nope".into()), 500)]
	#[case(Error::Internal("boom".into()), 500)]
	#[case(Error::Other(anyhow::anyhow!("db down")), 500)]
	fn test_status_code_mapping(#[case] error: Error, #[case] expected: u16) {
		assert_eq!(error.status_code(), expected);
	}

	#[rstest]
	fn test_client_error_classification() {
		assert!(Error::NotFound("/".into()).is_client_error());
		assert!(!Error::Internal("x".into()).is_client_error());
	}

	#[rstest]
	fn test_allowed_methods_only_on_method_not_allowed() {
		let err = Error::MethodNotAllowed {
			method: Method::DELETE,
			path: "/users".into(),
			allowed: vec![Method::GET, Method::POST],
		};
		assert_eq!(err.allowed_methods(), Some(&[Method::GET, Method::POST][..]));
		assert_eq!(Error::NotFound("/".into()).allowed_methods(), None);
	}

	#[rstest]
	fn test_pattern_error_message() {
		let err = Error::pattern("/a/{id", "unbalanced brace");
		assert_eq!(
			err.to_string(),
			"Invalid path pattern '/a/{id': unbalanced brace"
		);
	}

	#[rstest]
	fn test_serde_json_error_converts_to_serialization() {
		let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
		let err: Error = parse.into();
		assert!(matches!(err, Error::Serialization(_)));
	}
}
