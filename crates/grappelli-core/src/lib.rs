//! # Grappelli Core
//!
//! Shared building blocks for the Grappelli crates.
//!
//! At the moment this is the error taxonomy: every crate in the workspace
//! reports failures through [`exception::Error`], and the dispatcher maps each
//! variant onto an HTTP status code via [`exception::Error::status_code`].
//!
//! ```
//! use grappelli_core::exception::Error;
//!
//! let err = Error::NotFound("/missing".to_string());
//! assert_eq!(err.status_code(), 404);
//! ```

pub mod exception;

pub use exception::{Error, Result};
