//! Per-request context storage.
//!
//! Middleware uses the context to hand values to inner layers and handlers
//! (an authenticated principal, a data-access session, the request id).
//! Entries are keyed by type, so each type occupies at most one slot.
//!
//! A `Context` is created with its request and dropped with it. Clones share
//! the same storage, which lets a middleware keep a handle across
//! [`Next::run`](crate::Next::run) and read what inner layers wrote.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Type-keyed storage attached to a single request.
#[derive(Clone, Default)]
pub struct Context {
	map: Arc<Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>>,
}

impl Context {
	/// Creates an empty context.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::Context;
	///
	/// let context = Context::new();
	/// assert!(context.is_empty());
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `value`, replacing any previous value of the same type.
	///
	/// Returns the replaced value, if any.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::Context;
	///
	/// #[derive(Clone, Debug, PartialEq)]
	/// struct UserId(u64);
	///
	/// let context = Context::new();
	/// assert_eq!(context.insert(UserId(1)), None);
	/// assert_eq!(context.insert(UserId(2)), Some(UserId(1)));
	/// assert_eq!(context.get::<UserId>(), Some(UserId(2)));
	/// ```
	pub fn insert<T: Send + Sync + 'static>(&self, value: T) -> Option<T> {
		let mut map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		map.insert(TypeId::of::<T>(), Box::new(value))
			.and_then(|previous| previous.downcast::<T>().ok())
			.map(|boxed| *boxed)
	}

	/// Returns a clone of the stored value of type `T`.
	///
	/// Store `Arc<T>` for values that are expensive to clone.
	pub fn get<T>(&self) -> Option<T>
	where
		T: Clone + Send + Sync + 'static,
	{
		let map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		map.get(&TypeId::of::<T>())
			.and_then(|boxed| boxed.downcast_ref::<T>())
			.cloned()
	}

	/// Runs `f` against the stored value of type `T` without cloning it.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_http::Context;
	///
	/// let context = Context::new();
	/// context.insert(vec![1, 2, 3]);
	///
	/// let total = context.with::<Vec<i32>, _>(|v| v.iter().sum::<i32>());
	/// assert_eq!(total, Some(6));
	/// ```
	pub fn with<T, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R>
	where
		T: Send + Sync + 'static,
	{
		let map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		map.get(&TypeId::of::<T>())
			.and_then(|boxed| boxed.downcast_ref::<T>())
			.map(f)
	}

	/// Whether a value of type `T` is present.
	pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
		let map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		map.contains_key(&TypeId::of::<T>())
	}

	/// Removes and returns the stored value of type `T`.
	pub fn remove<T>(&self) -> Option<T>
	where
		T: Send + Sync + 'static,
	{
		let mut map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		let boxed = map.remove(&TypeId::of::<T>())?;
		boxed.downcast::<T>().ok().map(|value| *value)
	}

	/// Number of stored values.
	pub fn len(&self) -> usize {
		self.map.lock().unwrap_or_else(|e| e.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Drops every stored value.
	pub fn clear(&self) {
		let mut map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		map.clear();
	}
}

impl std::fmt::Debug for Context {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Context").field("len", &self.len()).finish()
	}
}
