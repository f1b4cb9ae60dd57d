// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0

//! Session controller.
//!
//! [`WalletSession`] is the only entry point that talks to the wallet
//! client. Each operation validates readiness synchronously, drives the
//! client, and turns successful responses into store events. Failed client
//! calls emit nothing, so the session stays in its prior state.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use url::Url;
use wallet_protocol::{AccountIdentity, EndpointInfo, Transaction, TransactionResult};
use wallet_runtime::{AccountListener, Error as ClientError, WalletClient};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::factory::{ClientFactory, RpcClientFactory};
use crate::listeners::Subscription;
use crate::store::{SessionEvent, SessionSnapshot, SessionStore};

/// Client-side session with a wallet process.
///
/// Cloning is cheap; clones share the same store and client.
///
/// # Example
///
/// ```ignore
/// use wallet::{RequestOrigin, SessionConfig, WalletSession};
///
/// let session = WalletSession::new(SessionConfig::new(RequestOrigin::new("My dApp")));
/// session.initialize();
/// session.connect().await?;
/// let accounts = session.get_accounts().await?;
/// ```
#[derive(Clone)]
pub struct WalletSession {
	config: SessionConfig,
	factory: Arc<dyn ClientFactory>,
	store: Arc<SessionStore>,
	/// Client that already carries this session's account listener.
	listening_on: Arc<Mutex<Option<Weak<dyn WalletClient>>>>,
}

impl WalletSession {
	/// Creates a session backed by [`RpcWalletClient`](wallet_runtime::RpcWalletClient).
	pub fn new(config: SessionConfig) -> Self {
		Self::with_factory(config, Arc::new(RpcClientFactory))
	}

	/// Creates a session whose clients come from `factory`.
	///
	/// Calls [`initialize`](Self::initialize) once if `config.auto_initialize` is set.
	pub fn with_factory(config: SessionConfig, factory: Arc<dyn ClientFactory>) -> Self {
		let session = Self {
			config,
			factory,
			store: Arc::new(SessionStore::new()),
			listening_on: Arc::new(Mutex::new(None)),
		};
		if session.config.auto_initialize {
			session.initialize();
		}
		session
	}

	/// Creates a client for the configured endpoint and origin and installs it.
	///
	/// A second call replaces the client. The previous client is not closed;
	/// account changes it reports afterwards are ignored.
	pub fn initialize(&self) {
		let client = self.factory.create(&self.config.endpoint);
		client.set_origin(self.config.origin.clone());

		if self.store.client().is_some() {
			debug!(endpoint = %self.config.endpoint, "Replacing wallet client");
		}
		info!(
			endpoint = %self.config.endpoint,
			origin = %self.config.origin.name,
			"Wallet session initialized"
		);
		self.store.dispatch(SessionEvent::Initialized { client });
	}

	/// Opens the channel to the wallet and records the reported endpoint.
	///
	/// After a successful connect, account changes pushed by the wallet
	/// update the session's current account.
	pub async fn connect(&self) -> Result<()> {
		let client = self.ensure_initialized()?;

		client
			.connect()
			.await
			.inspect_err(|e| warn!(error = %e, "Wallet connect failed"))?;
		let EndpointInfo { endpoint_url } = client
			.get_endpoint()
			.await
			.inspect_err(|e| warn!(error = %e, "Wallet endpoint query failed"))?;
		let endpoint_url = validate_endpoint(endpoint_url)
			.inspect_err(|e| warn!(error = %e, "Wallet reported an invalid endpoint"))?;

		info!(endpoint_url = %endpoint_url, "Connected to wallet");
		self.store.dispatch(SessionEvent::Connected { endpoint_url });
		self.listen_for_account_changes(&client);
		Ok(())
	}

	/// Closes the channel to the wallet.
	///
	/// The client and the last fetched account list are kept.
	pub async fn disconnect(&self) -> Result<()> {
		let client = self.ensure_ready()?;

		client
			.close()
			.await
			.inspect_err(|e| warn!(error = %e, "Wallet disconnect failed"))?;

		info!("Disconnected from wallet");
		self.store.dispatch(SessionEvent::Disconnected);
		Ok(())
	}

	/// Fetches every account the wallet exposes and stores the list.
	pub async fn get_accounts(&self) -> Result<Vec<AccountIdentity>> {
		let client = self.ensure_ready()?;

		let accounts = client
			.get_accounts()
			.await
			.inspect_err(|e| warn!(error = %e, "Fetching wallet accounts failed"))?;

		debug!(count = accounts.len(), "Fetched wallet accounts");
		self.store.dispatch(SessionEvent::AccountsFetched {
			accounts: accounts.clone(),
		});
		Ok(accounts)
	}

	/// Forwards `transaction` to the wallet and returns its result.
	///
	/// Session state is not changed.
	pub async fn send_transaction(
		&self,
		transaction: impl Into<Transaction>,
	) -> Result<TransactionResult> {
		let client = self.ensure_ready()?;

		let result = client
			.send_transaction(transaction.into())
			.await
			.inspect_err(|e| warn!(error = %e, "Sending transaction failed"))?;

		debug!(
			transaction_address = %result.transaction_address,
			confirmations = result.nb_confirmations,
			"Transaction sent"
		);
		Ok(result)
	}

	/// Returns the current session snapshot.
	pub fn snapshot(&self) -> SessionSnapshot {
		self.store.snapshot()
	}

	/// Returns true once a client is installed.
	pub fn is_initialized(&self) -> bool {
		self.store.client().is_some()
	}

	/// Returns true while connected to the wallet.
	pub fn is_connected(&self) -> bool {
		self.store.snapshot().connected
	}

	/// Registers `listener` to receive a snapshot after every transition.
	pub fn on_change<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&SessionSnapshot) + Send + Sync + 'static,
	{
		self.store.subscribe(listener)
	}

	/// Returns the underlying store.
	pub fn store(&self) -> &Arc<SessionStore> {
		&self.store
	}

	/// Returns the configuration this session was created with.
	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	fn ensure_initialized(&self) -> Result<Arc<dyn WalletClient>> {
		self.store.client().ok_or(SessionError::NotInitialized)
	}

	/// Initialized first, then connected, both from one read of the state.
	fn ensure_ready(&self) -> Result<Arc<dyn WalletClient>> {
		let session = self.store.session();
		let client = session.client.ok_or(SessionError::NotInitialized)?;
		if !session.connected {
			return Err(SessionError::NotConnected);
		}
		Ok(client)
	}

	/// Registers the account listener on `client` once per client.
	fn listen_for_account_changes(&self, client: &Arc<dyn WalletClient>) {
		{
			let mut listening_on = self.listening_on.lock();
			let already = listening_on
				.as_ref()
				.is_some_and(|weak| std::ptr::addr_eq(weak.as_ptr(), Arc::as_ptr(client)));
			if already {
				return;
			}
			*listening_on = Some(Arc::downgrade(client));
		}
		client.on_current_account_change(account_listener(&self.store, client));
	}
}

impl std::fmt::Debug for WalletSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WalletSession")
			.field("config", &self.config)
			.field("store", &self.store)
			.finish()
	}
}

/// Rejects an endpoint that does not parse as an absolute URL.
fn validate_endpoint(endpoint_url: String) -> Result<String> {
	match Url::parse(&endpoint_url) {
		Ok(_) => Ok(endpoint_url),
		Err(e) => Err(ClientError::Protocol(format!(
			"Invalid wallet endpoint {:?}: {}",
			endpoint_url, e
		))
		.into()),
	}
}

/// Builds the callback that turns wallet account pushes into store events.
///
/// Pushes are dropped once `owner` is no longer the session's client or the
/// session is disconnected.
fn account_listener(store: &Arc<SessionStore>, owner: &Arc<dyn WalletClient>) -> AccountListener {
	let store = Arc::downgrade(store);
	let owner = Arc::downgrade(owner);

	Arc::new(move |account: AccountIdentity| {
		let Some(store) = store.upgrade() else {
			return;
		};
		let address = account.address.clone();
		let applied = store.dispatch_if(
			|session| {
				if !session.is_current_client(owner.as_ptr()) {
					debug!(address = %address, "Ignoring account change from replaced client");
					return false;
				}
				if !session.connected {
					debug!(address = %address, "Ignoring account change while disconnected");
					return false;
				}
				true
			},
			SessionEvent::AccountChanged { account },
		);
		if applied.is_some() {
			debug!(address = %address, "Current account changed");
		}
	})
}
