//! # Grappelli Middleware
//!
//! Built-in middleware and the registry that assembles a chain from
//! settings.
//!
//! | Middleware | Identifier | Purpose |
//! |---|---|---|
//! | [`LoggingMiddleware`] | `grappelli.middleware.LoggingMiddleware` | one log event per request |
//! | [`RequestIdMiddleware`] | `grappelli.middleware.RequestIdMiddleware` | request id, tracing span, response header |
//! | [`AuthenticationMiddleware`] | registered by the application | bearer tokens, 401 challenge |
//! | [`DataSessionMiddleware`] | registered by the application | per-request data session with guaranteed release |

pub mod auth;
pub mod logging;
pub mod registry;
pub mod request_id;
pub mod session;

pub use grappelli_http::{Middleware, MiddlewareChain, Next};

pub use auth::{AuthConfig, AuthenticationMiddleware, CredentialValidator, Principal, StaticTokenValidator};
pub use logging::{LoggingConfig, LoggingMiddleware};
pub use registry::{
	LOGGING_MIDDLEWARE, MiddlewareFactory, MiddlewareRegistry, REQUEST_ID_MIDDLEWARE, parse_options,
};
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdConfig, RequestIdMiddleware};
pub use session::{DataSessionMiddleware, SessionOutcome, SessionProvider};
