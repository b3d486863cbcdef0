//! Template rendering collaborator.
//!
//! Grappelli does not ship a template language. Handlers that return
//! [`Reply::Template`](crate::Reply::Template) need a renderer configured on
//! the dispatcher; the renderer receives the template name and the context
//! and returns the rendered text.

use grappelli_core::exception::Result;

/// Renders a named template against a JSON context.
pub trait TemplateRenderer: Send + Sync {
	/// # Errors
	///
	/// Implementations should report a missing template or a rendering
	/// failure as [`Error::Template`](grappelli_core::Error::Template).
	fn render(&self, name: &str, context: &serde_json::Value) -> Result<String>;
}

impl<T: TemplateRenderer + ?Sized> TemplateRenderer for std::sync::Arc<T> {
	fn render(&self, name: &str, context: &serde_json::Value) -> Result<String> {
		(**self).render(name, context)
	}
}
