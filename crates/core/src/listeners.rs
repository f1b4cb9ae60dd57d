// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0

//! Change-listener registry.
//!
//! Listeners live in an [`IndexMap`] so removal is O(1) and notification
//! order is registration order. Each registration returns a [`Subscription`]
//! that removes the listener when dropped.

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

/// Listener callback receiving a borrowed value.
pub type ListenerFn<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Ordered listener storage.
pub(crate) struct ListenerRegistry<T> {
	entries: Arc<Mutex<IndexMap<ListenerId, ListenerFn<T>>>>,
}

impl<T: 'static> ListenerRegistry<T> {
	pub fn new() -> Self {
		Self {
			entries: Arc::new(Mutex::new(IndexMap::new())),
		}
	}

	/// Registers `listener` and returns the handle that removes it.
	pub fn register(&self, listener: ListenerFn<T>) -> Subscription {
		let id = next_listener_id();
		self.entries.lock().insert(id, listener);

		let weak: Weak<Mutex<IndexMap<ListenerId, ListenerFn<T>>>> = Arc::downgrade(&self.entries);
		Subscription::new(
			id,
			Arc::new(move |id: ListenerId| {
				if let Some(map) = weak.upgrade() {
					map.lock().shift_remove(&id);
				}
			}),
		)
	}

	/// Calls every listener with `value`, in registration order.
	///
	/// The registry lock is released before any listener runs, so a
	/// listener may register or drop subscriptions.
	pub fn notify(&self, value: &T) {
		let listeners: Vec<ListenerFn<T>> = self.entries.lock().values().cloned().collect();
		for listener in listeners {
			listener(value);
		}
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}
}

/// RAII handle that unregisters a listener on drop.
///
/// Holds a weak reference to the registry, so dropping it after the owning
/// store is gone is a no-op.
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

	/// Returns this subscription's listener ID.
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
