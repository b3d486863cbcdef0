//! Middleware registry.
//!
//! Maps the identifiers used in settings (`[[middleware]] path = "..."`) to
//! factories, so the chain can be assembled from configuration at startup.

use crate::logging::{LoggingConfig, LoggingMiddleware};
use crate::request_id::{RequestIdConfig, RequestIdMiddleware};
use grappelli_conf::MiddlewareConfig;
use grappelli_core::exception::{Error, Result};
use grappelli_http::{Middleware, MiddlewareChain};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

/// Identifier of [`LoggingMiddleware`].
pub const LOGGING_MIDDLEWARE: &str = "grappelli.middleware.LoggingMiddleware";
/// Identifier of [`RequestIdMiddleware`].
pub const REQUEST_ID_MIDDLEWARE: &str = "grappelli.middleware.RequestIdMiddleware";

/// Builds a middleware from its configuration entry.
pub type MiddlewareFactory =
	Arc<dyn Fn(&MiddlewareConfig) -> Result<Arc<dyn Middleware>> + Send + Sync>;

/// Identifier → factory table.
///
/// # Examples
///
/// ```
/// use grappelli_conf::MiddlewareConfig;
/// use grappelli_middleware::registry::{LOGGING_MIDDLEWARE, MiddlewareRegistry};
///
/// let registry = MiddlewareRegistry::with_builtins();
/// let chain = registry
///     .build_chain(&[MiddlewareConfig::new(LOGGING_MIDDLEWARE)])
///     .unwrap();
/// assert_eq!(chain.len(), 1);
///
/// assert!(registry.build_chain(&[MiddlewareConfig::new("no.such.Middleware")]).is_err());
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
	factories: HashMap<String, MiddlewareFactory>,
}

impl MiddlewareRegistry {
	/// An empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry knowing the middleware that need no application
	/// collaborators: logging and request ids.
	pub fn with_builtins() -> Self {
		Self::new()
			.with(LOGGING_MIDDLEWARE, |config| {
				let options: LoggingConfig = parse_options(config)?;
				Ok(Arc::new(LoggingMiddleware::with_config(options)))
			})
			.with(REQUEST_ID_MIDDLEWARE, |config| {
				let options: RequestIdConfig = parse_options(config)?;
				Ok(Arc::new(RequestIdMiddleware::with_config(options)))
			})
	}

	/// Registers `factory` under `path`, replacing any previous one.
	pub fn register<F>(&mut self, path: impl Into<String>, factory: F)
	where
		F: Fn(&MiddlewareConfig) -> Result<Arc<dyn Middleware>> + Send + Sync + 'static,
	{
		self.factories.insert(path.into(), Arc::new(factory));
	}

	pub fn with<F>(mut self, path: impl Into<String>, factory: F) -> Self
	where
		F: Fn(&MiddlewareConfig) -> Result<Arc<dyn Middleware>> + Send + Sync + 'static,
	{
		self.register(path, factory);
		self
	}

	pub fn contains(&self, path: &str) -> bool {
		self.factories.contains_key(path)
	}

	/// Instantiates one configured middleware.
	///
	/// # Errors
	///
	/// Returns [`Error::ImproperlyConfigured`] for an unknown identifier;
	/// factory errors are returned as they are.
	pub fn resolve(&self, config: &MiddlewareConfig) -> Result<Arc<dyn Middleware>> {
		let factory = self.factories.get(&config.path).ok_or_else(|| {
			Error::ImproperlyConfigured(format!("unknown middleware '{}'", config.path))
		})?;
		factory(config)
	}

	/// Builds a chain in configuration order, first entry outermost.
	pub fn build_chain(&self, configs: &[MiddlewareConfig]) -> Result<MiddlewareChain> {
		let mut chain = MiddlewareChain::new();
		for config in configs {
			let middleware = self.resolve(config)?;
			tracing::debug!(path = %config.path, "middleware installed");
			chain.add_middleware(middleware);
		}
		Ok(chain)
	}
}

/// Deserializes a configuration entry's options.
///
/// # Errors
///
/// Returns [`Error::ImproperlyConfigured`] naming the middleware when the
/// options do not match `T`.
pub fn parse_options<T: DeserializeOwned>(config: &MiddlewareConfig) -> Result<T> {
	config.options_as().map_err(|e| {
		Error::ImproperlyConfigured(format!("options of middleware '{}': {}", config.path, e))
	})
}
