// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0

//! Session state store.
//!
//! The session is a single record mutated only by [`reduce`], a pure
//! function from `(state, event)` to the next state. [`SessionStore`] holds
//! the one mutable cell, applies events in the order they are dispatched,
//! and notifies change listeners after every transition.
//!
//! The store never rejects an event. Preconditions (a client exists, the
//! session is connected) are enforced by [`WalletSession`] before it emits.
//!
//! [`WalletSession`]: crate::WalletSession

use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use serde::Serialize;
use wallet_protocol::AccountIdentity;
use wallet_runtime::WalletClient;

use crate::listeners::{ListenerRegistry, Subscription};

/// Complete session state, including the client handle.
#[derive(Clone, Default)]
pub struct Session {
	/// Wallet client; absent until initialized
	pub client: Option<Arc<dyn WalletClient>>,
	/// Endpoint reported by the wallet on connect
	pub endpoint_url: Option<String>,
	/// True between a successful connect and a disconnect
	pub connected: bool,
	/// Last account pushed by the wallet
	pub current_account: Option<AccountIdentity>,
	/// Last fetched account list; never refreshed automatically
	pub accounts: Vec<AccountIdentity>,
}

impl Session {
	/// Returns true once a client has been installed.
	pub fn is_initialized(&self) -> bool {
		self.client.is_some()
	}

	/// Returns the read-only view exposed to the application.
	pub fn snapshot(&self) -> SessionSnapshot {
		SessionSnapshot {
			initialized: self.is_initialized(),
			connected: self.connected,
			endpoint_url: self.endpoint_url.clone(),
			current_account: self.current_account.clone(),
			accounts: self.accounts.clone(),
		}
	}

	/// Returns true if `client` is this session's client.
	pub fn is_current_client(&self, client: *const dyn WalletClient) -> bool {
		self.client
			.as_ref()
			.is_some_and(|c| std::ptr::addr_eq(Arc::as_ptr(c), client))
	}
}

impl PartialEq for Session {
	fn eq(&self, other: &Self) -> bool {
		let same_client = match (&self.client, &other.client) {
			(Some(a), Some(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
			(None, None) => true,
			_ => false,
		};
		same_client
			&& self.endpoint_url == other.endpoint_url
			&& self.connected == other.connected
			&& self.current_account == other.current_account
			&& self.accounts == other.accounts
	}
}

impl std::fmt::Debug for Session {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session")
			.field("initialized", &self.is_initialized())
			.field("endpoint_url", &self.endpoint_url)
			.field("connected", &self.connected)
			.field("current_account", &self.current_account)
			.field("accounts", &self.accounts)
			.finish()
	}
}

/// Read-only view of the session handed to callers and listeners.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
	pub initialized: bool,
	pub connected: bool,
	pub endpoint_url: Option<String>,
	pub current_account: Option<AccountIdentity>,
	pub accounts: Vec<AccountIdentity>,
}

/// Discrete events that drive session transitions.
#[derive(Clone)]
pub enum SessionEvent {
	/// A new client replaced the previous one (if any).
	Initialized { client: Arc<dyn WalletClient> },
	/// The wallet accepted the connection and reported its endpoint.
	Connected { endpoint_url: String },
	/// The wallet pushed a new current account.
	AccountChanged { account: AccountIdentity },
	/// A full account list was fetched.
	AccountsFetched { accounts: Vec<AccountIdentity> },
	/// The channel to the wallet was closed.
	Disconnected,
}

impl SessionEvent {
	/// Short event name for logs.
	pub fn kind(&self) -> &'static str {
		match self {
			SessionEvent::Initialized { .. } => "initialized",
			SessionEvent::Connected { .. } => "connected",
			SessionEvent::AccountChanged { .. } => "account_changed",
			SessionEvent::AccountsFetched { .. } => "accounts_fetched",
			SessionEvent::Disconnected => "disconnected",
		}
	}
}

impl std::fmt::Debug for SessionEvent {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			SessionEvent::Initialized { .. } => f.write_str("Initialized"),
			SessionEvent::Connected { endpoint_url } => f
				.debug_struct("Connected")
				.field("endpoint_url", endpoint_url)
				.finish(),
			SessionEvent::AccountChanged { account } => f
				.debug_struct("AccountChanged")
				.field("account", account)
				.finish(),
			SessionEvent::AccountsFetched { accounts } => f
				.debug_struct("AccountsFetched")
				.field("accounts", accounts)
				.finish(),
			SessionEvent::Disconnected => f.write_str("Disconnected"),
		}
	}
}

/// Applies `event` to `state` and returns the next state.
///
/// Total and deterministic: the result depends only on the two inputs.
pub fn reduce(state: &Session, event: SessionEvent) -> Session {
	let mut next = state.clone();
	match event {
		SessionEvent::Initialized { client } => {
			next.client = Some(client);
		}
		SessionEvent::Connected { endpoint_url } => {
			next.endpoint_url = Some(endpoint_url);
			next.connected = true;
		}
		SessionEvent::AccountChanged { account } => {
			next.current_account = Some(account);
		}
		SessionEvent::AccountsFetched { accounts } => {
			next.accounts = accounts;
		}
		SessionEvent::Disconnected => {
			next.endpoint_url = None;
			next.connected = false;
			next.current_account = None;
		}
	}
	next
}

/// Holds the session cell and its change listeners.
pub struct SessionStore {
	state: Mutex<Session>,
	/// Serializes transitions and their notifications; reentrant so a
	/// listener may dispatch.
	dispatch_lock: ReentrantMutex<()>,
	listeners: ListenerRegistry<SessionSnapshot>,
}

impl SessionStore {
	/// Creates a store holding the default (uninitialized, disconnected) session.
	pub fn new() -> Self {
		Self {
			state: Mutex::new(Session::default()),
			dispatch_lock: ReentrantMutex::new(()),
			listeners: ListenerRegistry::new(),
		}
	}

	/// Applies `event`, then notifies every listener with the new snapshot.
	///
	/// Transitions never interleave: each event's read-modify-write and its
	/// notifications complete before the next dispatch proceeds.
	pub fn dispatch(&self, event: SessionEvent) -> SessionSnapshot {
		self.dispatch_if(|_| true, event)
			.unwrap_or_else(|| self.snapshot())
	}

	/// Applies `event` only if `guard` accepts the current state.
	///
	/// The guard runs under the same lock as the transition, so no other
	/// event can land between the check and the apply. The guard must not
	/// call back into the store. Returns `None`, and notifies nobody, when
	/// the guard rejects.
	pub fn dispatch_if<G>(&self, guard: G, event: SessionEvent) -> Option<SessionSnapshot>
	where
		G: FnOnce(&Session) -> bool,
	{
		let _serial = self.dispatch_lock.lock();
		let kind = event.kind();

		let snapshot = {
			let mut state = self.state.lock();
			if !guard(&state) {
				tracing::debug!(event = kind, "Session transition rejected by guard");
				return None;
			}
			let next = reduce(&state, event);
			*state = next;
			state.snapshot()
		};

		tracing::debug!(
			event = kind,
			initialized = snapshot.initialized,
			connected = snapshot.connected,
			accounts = snapshot.accounts.len(),
			"Session transition"
		);

		self.listeners.notify(&snapshot);
		Some(snapshot)
	}

	/// Returns the current read-only snapshot.
	pub fn snapshot(&self) -> SessionSnapshot {
		self.state.lock().snapshot()
	}

	/// Returns a copy of the full session state.
	pub fn session(&self) -> Session {
		self.state.lock().clone()
	}

	/// Returns the current client, if initialized.
	pub fn client(&self) -> Option<Arc<dyn WalletClient>> {
		self.state.lock().client.clone()
	}

	/// Registers a listener called after every transition.
	///
	/// Dropping the returned [`Subscription`] removes the listener.
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&SessionSnapshot) + Send + Sync + 'static,
	{
		self.listeners.register(Arc::new(listener))
	}

	/// Returns the number of registered listeners.
	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}
}

impl Default for SessionStore {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for SessionStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionStore")
			.field("state", &*self.state.lock())
			.field("listeners", &self.listeners.len())
			.finish()
	}
}
