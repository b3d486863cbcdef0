//! Bearer-token authentication middleware.
//!
//! Requests without a valid `Authorization: Bearer <token>` header are
//! answered with 401 before any inner middleware or the handler runs.
//! Authenticated requests carry the resolved [`Principal`] in their context.

use async_trait::async_trait;
use grappelli_core::exception::{Error, Result};
use grappelli_http::{Middleware, Next, Request, Response, header};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
	pub id: String,
	pub roles: Vec<String>,
}

impl Principal {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			roles: Vec::new(),
		}
	}

	pub fn with_role(mut self, role: impl Into<String>) -> Self {
		self.roles.push(role.into());
		self
	}

	pub fn has_role(&self, role: &str) -> bool {
		self.roles.iter().any(|r| r == role)
	}

	/// The principal stored on `request` by [`AuthenticationMiddleware`].
	///
	/// # Errors
	///
	/// Returns [`Error::Authentication`] when the request is anonymous.
	pub fn from_request(request: &Request) -> Result<Self> {
		request
			.context
			.get::<Principal>()
			.ok_or_else(|| Error::Authentication("no authenticated principal".to_string()))
	}

	/// Like [`from_request`](Self::from_request), also requiring `role`.
	///
	/// # Errors
	///
	/// Returns [`Error::Authorization`] when the principal lacks `role`.
	pub fn require_role(request: &Request, role: &str) -> Result<Self> {
		let principal = Self::from_request(request)?;
		if !principal.has_role(role) {
			return Err(Error::Authorization(format!(
				"'{}' requires role '{}'",
				request.path(),
				role
			)));
		}
		Ok(principal)
	}
}

/// Checks credentials; the data store behind it is up to the application.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
	/// Returns the principal owning `token`, or `None` when the token is not
	/// recognized.
	///
	/// # Errors
	///
	/// Errors are for failures of the backing store, not for bad tokens.
	async fn validate(&self, token: &str) -> Result<Option<Principal>>;
}

/// A fixed token table, for tests and internal services.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenValidator {
	tokens: HashMap<String, Principal>,
}

impl StaticTokenValidator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_token(mut self, token: impl Into<String>, principal: Principal) -> Self {
		self.tokens.insert(token.into(), principal);
		self
	}
}

#[async_trait]
impl CredentialValidator for StaticTokenValidator {
	async fn validate(&self, token: &str) -> Result<Option<Principal>> {
		Ok(self.tokens.get(token).cloned())
	}
}

/// Options for [`AuthenticationMiddleware`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
	/// Realm advertised in the `WWW-Authenticate` challenge.
	pub realm: String,
	/// Paths served without authentication, along with everything below them.
	pub exempt_paths: Vec<String>,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			realm: "grappelli".to_string(),
			exempt_paths: Vec::new(),
		}
	}
}

/// Short-circuits unauthenticated requests with 401.
///
/// # Examples
///
/// ```
/// use grappelli_http::{Endpoint, MiddlewareChain, Request, Response};
/// use grappelli_middleware::{AuthenticationMiddleware, Principal, StaticTokenValidator};
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
/// let validator = StaticTokenValidator::new().with_token("s3cret", Principal::new("alice"));
/// let chain = MiddlewareChain::new()
///     .with_middleware(Arc::new(AuthenticationMiddleware::new(Arc::new(validator))));
///
/// # tokio_test::block_on(async {
/// let anonymous = Request::builder().uri("/").build().unwrap();
/// assert_eq!(chain.run(anonymous, &Ok200).await.unwrap().status.as_u16(), 401);
///
/// let signed = Request::builder()
///     .uri("/")
///     .header("Authorization", "Bearer s3cret")
///     .build()
///     .unwrap();
/// assert_eq!(chain.run(signed, &Ok200).await.unwrap().status.as_u16(), 200);
/// # });
/// ```
pub struct AuthenticationMiddleware {
	validator: Arc<dyn CredentialValidator>,
	config: AuthConfig,
}

impl AuthenticationMiddleware {
	pub fn new(validator: Arc<dyn CredentialValidator>) -> Self {
		Self::with_config(validator, AuthConfig::default())
	}

	pub fn with_config(validator: Arc<dyn CredentialValidator>, config: AuthConfig) -> Self {
		Self { validator, config }
	}

	fn challenge(&self, detail: &str) -> Result<Response> {
		Response::unauthorized()
			.with_header(
				header::WWW_AUTHENTICATE.as_str(),
				&format!("Bearer realm=\"{}\"", self.config.realm),
			)
			.with_json(&json!({
				"status": 401,
				"error": "Unauthorized",
				"detail": detail,
			}))
	}
}

fn bearer_token(request: &Request) -> Option<&str> {
	let value = request.header(header::AUTHORIZATION.as_str())?;
	let (scheme, token) = value.split_once(' ')?;
	let token = token.trim();
	(scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl Middleware for AuthenticationMiddleware {
	async fn process(&self, request: Request, next: Next<'_>) -> Result<Response> {
		let Some(token) = bearer_token(&request) else {
			tracing::debug!(path = request.path(), "missing credentials");
			return self.challenge("missing credentials");
		};

		match self.validator.validate(token).await? {
			Some(principal) => {
				tracing::debug!(principal = %principal.id, "request authenticated");
				request.context.insert(principal);
				next.run(request).await
			}
			None => {
				tracing::debug!(path = request.path(), "invalid credentials");
				self.challenge("invalid credentials")
			}
		}
	}

	fn should_continue(&self, request: &Request) -> bool {
		let path = request.path();
		!self
			.config
			.exempt_paths
			.iter()
			.any(|prefix| is_under(path, prefix))
	}

	fn name(&self) -> &str {
		"AuthenticationMiddleware"
	}
}

/// Whether `path` is `prefix` itself or lies below it; `/health` covers
/// `/health/db` but not `/healthz`.
fn is_under(path: &str, prefix: &str) -> bool {
	match path.strip_prefix(prefix) {
		Some(rest) => rest.is_empty() || prefix.ends_with('/') || rest.starts_with('/'),
		None => false,
	}
}
