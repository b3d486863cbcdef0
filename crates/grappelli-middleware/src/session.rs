//! Data-access session middleware.
//!
//! Acquires one session per request from a [`SessionProvider`], hands it to
//! the handler through the request context and releases it when the request
//! completes. Release happens in a drop guard, so it also runs when the chain
//! returns an error or the request future is dropped on cancellation.

use async_trait::async_trait;
use grappelli_core::exception::Result;
use grappelli_http::{Middleware, Next, Request, Response};
use std::sync::Arc;

/// How a session is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
	/// The response is below 500.
	Commit,
	/// Error, 5xx response or cancellation.
	Rollback,
}

/// Source of per-request data-access sessions.
#[async_trait]
pub trait SessionProvider: Send + Sync + 'static {
	/// Handle stored in the request context; handlers read it with
	/// `request.context.get::<Session>()`.
	type Session: Clone + Send + Sync + 'static;

	async fn acquire(&self) -> Result<Self::Session>;

	/// Ends the session. Runs from a destructor, so it cannot await.
	fn release(&self, session: Self::Session, outcome: SessionOutcome);
}

/// Releases the session on drop; rolls back unless committed.
struct SessionGuard<P: SessionProvider> {
	provider: Arc<P>,
	session: Option<P::Session>,
	outcome: SessionOutcome,
}

impl<P: SessionProvider> SessionGuard<P> {
	fn commit(&mut self) {
		self.outcome = SessionOutcome::Commit;
	}
}

impl<P: SessionProvider> Drop for SessionGuard<P> {
	fn drop(&mut self) {
		if let Some(session) = self.session.take() {
			tracing::debug!(outcome = ?self.outcome, "releasing data session");
			self.provider.release(session, self.outcome);
		}
	}
}

pub struct DataSessionMiddleware<P: SessionProvider> {
	provider: Arc<P>,
}

impl<P: SessionProvider> DataSessionMiddleware<P> {
	pub fn new(provider: Arc<P>) -> Self {
		Self { provider }
	}
}

#[async_trait]
impl<P: SessionProvider> Middleware for DataSessionMiddleware<P> {
	async fn process(&self, request: Request, next: Next<'_>) -> Result<Response> {
		let session = self.provider.acquire().await?;
		let mut guard = SessionGuard {
			provider: Arc::clone(&self.provider),
			session: Some(session.clone()),
			outcome: SessionOutcome::Rollback,
		};
		let context = request.context.clone();
		context.insert(session);

		let result = next.run(request).await;

		// No handle may outlive the release
		context.remove::<P::Session>();
		if matches!(&result, Ok(response) if !response.status.is_server_error()) {
			guard.commit();
		}
		drop(guard);
		result
	}

	fn name(&self) -> &str {
		"DataSessionMiddleware"
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use grappelli_core::Error;
	use grappelli_http::{Endpoint, MiddlewareChain, StatusCode};
	use rstest::rstest;
	use std::sync::Mutex;
	use std::sync::atomic::{AtomicU64, Ordering};
	use std::time::Duration;

	#[derive(Default)]
	struct Recorder {
		next_id: AtomicU64,
		released: Mutex<Vec<(u64, SessionOutcome)>>,
	}

	#[async_trait]
	impl SessionProvider for Recorder {
		type Session = u64;

		async fn acquire(&self) -> Result<u64> {
			Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
		}

		fn release(&self, session: u64, outcome: SessionOutcome) {
			self.released.lock().unwrap().push((session, outcome));
		}
	}

	/// Answers with the status given in the path, or errors on `/error`.
	struct StatusEndpoint;

	#[async_trait]
	impl Endpoint for StatusEndpoint {
		async fn call(&self, request: Request) -> Result<Response> {
			assert!(request.context.get::<u64>().is_some());
			match request.path() {
				"/error" => Err(Error::Internal("boom".to_string())),
				"/slow" => {
					tokio::time::sleep(Duration::from_secs(60)).await;
					Ok(Response::ok())
				}
				path => {
					let code: u16 = path.trim_start_matches('/').parse().unwrap();
					Ok(Response::new(StatusCode::from_u16(code).unwrap()))
				}
			}
		}
	}

	fn chain(provider: Arc<Recorder>) -> MiddlewareChain {
		MiddlewareChain::new().with_middleware(Arc::new(DataSessionMiddleware::new(provider)))
	}

	#[rstest]
	#[case("/200", SessionOutcome::Commit)]
	#[case("/404", SessionOutcome::Commit)]
	#[case("/503", SessionOutcome::Rollback)]
	#[case("/error", SessionOutcome::Rollback)]
	#[tokio::test]
	async fn test_release_outcome(#[case] path: &str, #[case] outcome: SessionOutcome) {
		let provider = Arc::new(Recorder::default());
		let request = Request::builder().uri(path).build().unwrap();

		let _ = chain(provider.clone()).run(request, &StatusEndpoint).await;

		assert_eq!(*provider.released.lock().unwrap(), vec![(0, outcome)]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_cancellation_rolls_back() {
		let provider = Arc::new(Recorder::default());
		let chain = chain(provider.clone());
		let request = Request::builder().uri("/slow").build().unwrap();

		let result = tokio::time::timeout(
			Duration::from_millis(20),
			chain.run(request, &StatusEndpoint),
		)
		.await;

		assert!(result.is_err());
		assert_eq!(
			*provider.released.lock().unwrap(),
			vec![(0, SessionOutcome::Rollback)]
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_session_removed_from_context_after_release() {
		let provider = Arc::new(Recorder::default());
		let request = Request::builder().uri("/200").build().unwrap();
		let context = request.context.clone();

		chain(provider).run(request, &StatusEndpoint).await.unwrap();

		assert!(context.get::<u64>().is_none());
	}
}
