//! Notification listeners.
//!
//! Listeners are stored in an [`IndexMap`] keyed by [`ListenerId`], giving
//! O(1) removal and delivery in registration order. Registration returns a
//! [`Subscription`] guard that unregisters on drop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

/// Unique identifier for a registered listener.
pub type ListenerId = u64;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new globally-unique listener ID.
pub fn next_listener_id() -> ListenerId {
	NEXT_LISTENER_ID.fetch_add(1, Ordering::SeqCst)
}

/// Listener callback for events of type `E`.
pub type ListenerFn<E> = Arc<dyn Fn(&E) + Send + Sync>;

type ListenerMap<E> = Arc<Mutex<IndexMap<ListenerId, ListenerFn<E>>>>;

/// Set of listeners for one event type.
pub struct Listeners<E> {
	map: ListenerMap<E>,
}

impl<E> Default for Listeners<E> {
	fn default() -> Self {
		Self {
			map: Arc::new(Mutex::new(IndexMap::new())),
		}
	}
}

impl<E: 'static> Listeners<E> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `listener`. It stays registered until the returned guard drops.
	pub fn add<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&E) + Send + Sync + 'static,
	{
		let id = next_listener_id();
		self.map.lock().insert(id, Arc::new(listener));

		let weak: Weak<Mutex<IndexMap<ListenerId, ListenerFn<E>>>> = Arc::downgrade(&self.map);
		Subscription::new(
			id,
			Arc::new(move |id| {
				if let Some(map) = weak.upgrade() {
					map.lock().shift_remove(&id);
				}
			}),
		)
	}

	/// Calls every listener with `event`, in registration order.
	///
	/// The lock is released before listeners run, so a listener may drop its
	/// own subscription.
	pub fn emit(&self, event: &E) {
		let listeners: Vec<ListenerFn<E>> = self.map.lock().values().cloned().collect();
		for listener in listeners {
			listener(event);
		}
	}

	pub fn len(&self) -> usize {
		self.map.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// RAII handle that unregisters a listener on drop.
///
/// Holds a weak reference to the listener set, so dropping it after the
/// owner is gone is a no-op.
pub struct Subscription {
	id: ListenerId,
	dropper: Option<Arc<dyn Fn(ListenerId) + Send + Sync>>,
}

impl Subscription {
	fn new(id: ListenerId, dropper: Arc<dyn Fn(ListenerId) + Send + Sync>) -> Self {
		Self {
			id,
			dropper: Some(dropper),
		}
	}

	pub fn id(&self) -> ListenerId {
		self.id
	}

	/// Explicitly unsubscribes. Equivalent to dropping.
	pub fn unsubscribe(mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.dropper.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::AtomicUsize;

	use super::*;

	#[test]
	fn test_listener_ids_increase() {
		let id1 = next_listener_id();
		let id2 = next_listener_id();
		assert!(id2 > id1);
	}

	#[test]
	fn test_emit_reaches_listeners_until_dropped() {
		let listeners: Listeners<u32> = Listeners::new();
		let total = Arc::new(AtomicUsize::new(0));

		let counter = Arc::clone(&total);
		let sub = listeners.add(move |n| {
			counter.fetch_add(*n as usize, Ordering::SeqCst);
		});

		listeners.emit(&2);
		assert_eq!(total.load(Ordering::SeqCst), 2);

		drop(sub);
		listeners.emit(&5);
		assert_eq!(total.load(Ordering::SeqCst), 2);
		assert!(listeners.is_empty());
	}

	#[test]
	fn test_unsubscribe_removes_listener() {
		let listeners: Listeners<()> = Listeners::new();
		let sub = listeners.add(|_| {});
		assert_eq!(listeners.len(), 1);
		sub.unsubscribe();
		assert_eq!(listeners.len(), 0);
	}

	#[test]
	fn test_subscription_outlives_listener_set() {
		let listeners: Listeners<()> = Listeners::new();
		let sub = listeners.add(|_| {});
		drop(listeners);
		drop(sub);
	}
}
