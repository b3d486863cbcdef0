//! # Grappelli Dispatch
//!
//! Request dispatching for Grappelli: the piece that ties the route table,
//! the middleware chain and handlers together, the way Django's
//! `django.core.handlers` does.
//!
//! ## Architecture
//!
//! ```text
//! Request → Dispatcher → Middleware Chain → RoutingEndpoint → Handler
//!               │              │                  │              │
//!               │          Err(error)      resolve + bind     Reply
//!               │              ↓                                 ↓
//!               └──── ExceptionHandler ←──────────────────── normalize
//!                              ↓
//!                          Response
//! ```
//!
//! - The root [`RouteTable`](grappelli_urls::RouteTable) lives behind an
//!   `ArcSwap`; [`Dispatcher::reload`] swaps it without blocking requests.
//! - [`Dispatcher::handle`] never fails: errors become responses through
//!   [`ExceptionHandler`].
//! - [`Dispatcher::handle_with_cancellation`] drops the in-flight request
//!   when the caller goes away.
//!
//! ## Example
//!
//! ```rust
//! use grappelli_dispatch::Dispatcher;
//! use grappelli_http::{Reply, Request, handler_fn};
//! use grappelli_urls::{RouteTable, include, path};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let users = RouteTable::builder()
//!     .route(
//!         path("/users/{id:int}", handler_fn(|req: Request| async move {
//!             let id = req.path_params.get_int("id").unwrap_or_default();
//!             Reply::json(&serde_json::json!({ "id": id }))
//!         }))
//!         .unwrap()
//!         .with_name("user_detail"),
//!     )
//!     .build()
//!     .unwrap();
//! let root = RouteTable::builder()
//!     .route(include("/app1/", users).unwrap())
//!     .build()
//!     .unwrap();
//!
//! let dispatcher = Dispatcher::builder(root)
//!     .request_timeout(Duration::from_secs(5))
//!     .build();
//!
//! let response = dispatcher
//!     .handle(Request::builder().uri("/app1/users/42").build().unwrap())
//!     .await;
//! assert_eq!(response.body_text(), r#"{"id":42}"#);
//! # });
//! ```

pub mod dispatcher;
pub mod exception;
pub mod reply;

pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use exception::{ExceptionHandler, convert_exception_to_response};
pub use reply::normalize;
