//! # Grappelli
//!
//! A Django-inspired URL routing and middleware dispatch core for Rust.
//!
//! Grappelli matches incoming requests against a tree of app-scoped route
//! tables, threads them through an ordered middleware chain, invokes the
//! resolved handler and normalizes whatever it returns into a response.
//!
//! ## Crates
//!
//! | Crate | Purpose |
//! |---|---|
//! | `grappelli-core` | error taxonomy and status mapping |
//! | `grappelli-http` | request/response model, handlers, middleware chain |
//! | `grappelli-urls` | path patterns, route tables, mounts, reverse lookup |
//! | `grappelli-dispatch` | the [`Dispatcher`] |
//! | `grappelli-middleware` | built-in middleware and the registry |
//! | `grappelli-conf` | layered settings and logging setup |
//!
//! ## Quick Example
//!
//! ```rust
//! use grappelli::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let polls = RouteTable::builder()
//!     .route(
//!         path("/{id:int}/", handler_fn(|req: Request| async move {
//!             let id = req.path_params.get_int("id").unwrap_or_default();
//!             Reply::json(&serde_json::json!({ "poll": id }))
//!         }))
//!         .unwrap()
//!         .with_name("detail"),
//!     )
//!     .build()
//!     .unwrap();
//! let urls = RouteTable::builder()
//!     .route(include("/polls/", polls).unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(urls.reverse_with("polls.detail", &[("id", 3)]).unwrap(), "/polls/3/");
//!
//! let dispatcher = Dispatcher::builder(urls).build();
//! let response = dispatcher
//!     .handle(Request::builder().uri("/polls/3/").build().unwrap())
//!     .await;
//! assert_eq!(response.status, StatusCode::OK);
//! # });
//! ```

pub use grappelli_core::exception::{self, Error, Result};

pub use grappelli_http::{
	BlockingHandler, Context, Endpoint, FunctionHandler, Handler, HeaderMap, Method, Middleware,
	MiddlewareChain, Next, ParamValue, PathParams, QueryParams, Reply, Request, RequestBuilder,
	ResolverMatch, Response, StatusCode, TemplateRenderer, Uri, Version, blocking_fn, handler_fn,
	header,
};

pub use grappelli_urls::{
	Converter, Namespace, PathPattern, Resolution, ResolvedRoute, Route, RouteInfo, RouteTable,
	RouteTableBuilder, RouteTarget, include, path,
};

pub use grappelli_dispatch::{
	Dispatcher, DispatcherBuilder, ExceptionHandler, convert_exception_to_response,
};

pub use grappelli_conf::{MiddlewareConfig, Settings, SettingsBuilder, init_logging};

pub use grappelli_middleware::{
	AuthenticationMiddleware, DataSessionMiddleware, LoggingMiddleware, MiddlewareRegistry,
	Principal, RequestId, RequestIdMiddleware,
};

/// Module re-exports.
pub mod urls {
	pub use grappelli_urls::*;
}

pub mod conf {
	pub use grappelli_conf::*;
}

pub mod middleware {
	pub use grappelli_middleware::*;
}

/// Everything an application module usually needs.
pub mod prelude {
	pub use crate::{
		Dispatcher, Error, Handler, Method, Middleware, MiddlewareChain, Next, Reply, Request,
		Response, Result, RouteTable, StatusCode, handler_fn, include, path,
	};

	pub use async_trait::async_trait;

		pub use crate::Settings;

		pub use crate::{LoggingMiddleware, MiddlewareRegistry, RequestIdMiddleware};
}
