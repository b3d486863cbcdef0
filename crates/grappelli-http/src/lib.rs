//! # Grappelli HTTP
//!
//! Request/response model and the two extension seams of the framework:
//!
//! - [`Handler`]: application code bound to a route. Returns a [`Reply`],
//!   which the dispatcher normalizes into a [`Response`].
//! - [`Middleware`]: a unit wrapping the rest of the chain, with a pre-phase
//!   before [`Next::run`] and a post-phase after it.
//!
//! ## Example
//!
//! ```rust
//! use grappelli_http::{Handler, Reply, Request};
//! use async_trait::async_trait;
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Handler for Hello {
//!     async fn handle(&self, request: Request) -> grappelli_core::Result<Reply> {
//!         Reply::json(&serde_json::json!({ "path": request.path() }))
//!     }
//! }
//! ```

pub mod context;
pub mod handler;
pub mod middleware;
pub mod params;
pub mod query;
pub mod request;
pub mod resolver_match;
pub mod response;
pub mod template;

pub use context::Context;
pub use handler::{BlockingHandler, FunctionHandler, Handler, Reply, blocking_fn, handler_fn};
pub use middleware::{Endpoint, Middleware, MiddlewareChain, Next};
pub use params::{ParamValue, PathParams};
pub use query::QueryParams;
pub use request::{Request, RequestBody, RequestBuilder};
pub use resolver_match::ResolverMatch;
pub use response::Response;
pub use template::TemplateRenderer;

pub use grappelli_core::exception::{Error, Result};

// Re-export the HTTP vocabulary types so callers don't need a direct hyper dependency.
pub use hyper::{HeaderMap, Method, StatusCode, Uri, Version, header};
