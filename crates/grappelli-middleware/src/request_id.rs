//! Request id middleware.
//!
//! Tags every request with an id, stores it in the request context as
//! [`RequestId`], runs the rest of the chain inside a `request` span carrying
//! it, and echoes it in the response headers.

use async_trait::async_trait;
use grappelli_core::exception::Result;
use grappelli_http::{Middleware, Next, Request, Response};
use serde::Deserialize;
use tracing::Instrument;
use uuid::Uuid;

/// Default header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

const MAX_INCOMING_ID_LENGTH: usize = 128;

/// The id assigned to the current request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// Options for [`RequestIdMiddleware`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RequestIdConfig {
	pub header_name: String,
	/// Reuse a well-formed id sent by the client instead of generating one.
	pub trust_incoming: bool,
}

impl Default for RequestIdConfig {
	fn default() -> Self {
		Self {
			header_name: REQUEST_ID_HEADER.to_string(),
			trust_incoming: true,
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
	config: RequestIdConfig,
}

impl RequestIdMiddleware {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_config(config: RequestIdConfig) -> Self {
		Self { config }
	}

	fn incoming_id(&self, request: &Request) -> Option<String> {
		if !self.config.trust_incoming {
			return None;
		}
		request
			.header(&self.config.header_name)
			.map(str::trim)
			.filter(|id| {
				!id.is_empty()
					&& id.len() <= MAX_INCOMING_ID_LENGTH
					&& id
						.bytes()
						.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
			})
			.map(str::to_string)
	}
}

#[async_trait]
impl Middleware for RequestIdMiddleware {
	async fn process(&self, request: Request, next: Next<'_>) -> Result<Response> {
		let id = self
			.incoming_id(&request)
			.unwrap_or_else(|| Uuid::new_v4().to_string());
		request.context.insert(RequestId(id.clone()));

		let span = tracing::info_span!("request", request_id = %id, method = %request.method);
		let response = next.run(request).instrument(span).await?;
		Ok(response.with_header(&self.config.header_name, &id))
	}

	fn name(&self) -> &str {
		"RequestIdMiddleware"
	}
}
