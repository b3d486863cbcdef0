//! # Grappelli URLs
//!
//! URL routing for Grappelli, modeled on Django's `urls.py`.
//!
//! ## Features
//!
//! - **Path patterns**: `/users/{id:int}/` with `str`, `int`, `slug`, `uuid`
//!   and wildcard (`path` / `*`) parameters
//! - **Route tables**: ordered, first match wins, immutable once built
//! - **Mounts**: [`include`] a table under a prefix; the mount's namespace
//!   qualifies the nested route names
//! - **Reverse lookup**: [`RouteTable::reverse`] builds URLs from route names
//!
//! ## Example
//!
//! ```rust
//! use grappelli_http::{Method, Request, Response, handler_fn};
//! use grappelli_urls::{Resolution, RouteTable, include, path};
//!
//! let users = RouteTable::builder()
//!     .route(
//!         path("/users", handler_fn(|_req: Request| async { Ok(Response::ok()) }))
//!             .unwrap()
//!             .with_name("user_list"),
//!     )
//!     .build()
//!     .unwrap();
//! let urlconf = RouteTable::builder()
//!     .route(include("/app1/", users).unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert!(matches!(urlconf.resolve(&Method::GET, "/app1/users"), Resolution::Matched(_)));
//! assert_eq!(urlconf.reverse_with::<&str, &str>("app1.user_list", &[]).unwrap(), "/app1/users");
//! ```

pub mod converters;
pub mod namespace;
pub mod pattern;
pub mod reverse;
pub mod route;
pub mod table;

pub use converters::Converter;
pub use namespace::Namespace;
pub use pattern::{MAX_PATH_SEGMENTS, MAX_PATTERN_LENGTH, PathPattern, Segment};
pub use route::{Route, RouteTarget, include, path};
pub use table::{Resolution, ResolvedRoute, RouteInfo, RouteTable, RouteTableBuilder};

pub use grappelli_core::exception::{Error, Result};
