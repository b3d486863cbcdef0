//! # Grappelli Configuration
//!
//! Django-inspired settings for the dispatcher.
//!
//! Settings are merged from layered sources, lowest priority first:
//!
//! 1. built-in defaults
//! 2. a TOML file
//! 3. `GRAPPELLI_*` environment variables
//!
//! ```toml
//! debug = false
//! request_timeout_ms = 5000
//! log_filter = "grappelli=debug,info"
//!
//! [[middleware]]
//! path = "grappelli.middleware.RequestIdMiddleware"
//!
//! [[middleware]]
//! path = "grappelli.middleware.LoggingMiddleware"
//! options = { slow_request_ms = 500 }
//! ```

pub mod builder;
pub mod logging;
pub mod settings;
pub mod sources;

pub use builder::{MergedSettings, SettingsBuilder};
pub use logging::init_logging;
pub use settings::{ENV_PREFIX, MiddlewareConfig, Settings};
pub use sources::{ConfigSource, DefaultSource, EnvSource, SourceError, TomlFileSource};
