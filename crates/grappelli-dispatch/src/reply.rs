//! Handler reply normalization.

use grappelli_core::exception::{Error, Result};
use grappelli_http::{Reply, Response, TemplateRenderer};

/// Turns a handler's [`Reply`] into a [`Response`].
///
/// - `Json` is serialized with `Content-Type: application/json`
/// - `Template` is rendered by `renderer` as `text/html; charset=utf-8`
/// - `Response` passes through unchanged
///
/// # Errors
///
/// Returns [`Error::ImproperlyConfigured`] for a template reply without a
/// renderer, and whatever the renderer or serializer reports otherwise.
///
/// # Examples
///
/// ```
/// use grappelli_dispatch::reply::normalize;
/// use grappelli_http::Reply;
///
/// let response = normalize(Reply::json(&serde_json::json!({"ok": true})).unwrap(), None).unwrap();
/// assert_eq!(response.content_type(), Some("application/json"));
/// assert_eq!(response.body_text(), r#"{"ok":true}"#);
/// ```
pub fn normalize(reply: Reply, renderer: Option<&dyn TemplateRenderer>) -> Result<Response> {
	match reply {
		Reply::Json { status, payload } => Response::new(status).with_json(&payload),
		Reply::Template {
			status,
			name,
			context,
		} => {
			let renderer = renderer.ok_or_else(|| {
				Error::ImproperlyConfigured(format!(
					"template '{}' returned but no template renderer is configured",
					name
				))
			})?;
			let html = renderer.render(&name, &context)?;
			Ok(Response::new(status).with_html(html))
		}
		Reply::Response(response) => Ok(response),
	}
}
