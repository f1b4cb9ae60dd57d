//! RpcWalletClient - [`WalletClient`] over a WebSocket JSON-RPC connection.
//!
//! Every request carries the configured [`RequestOrigin`] in a
//! [`RequestEnvelope`]. Current-account listeners are backed by a single
//! `subscribeCurrentAccount` subscription, opened on connect (or as soon
//! as the first listener registers on a live connection) and fanned out
//! locally to every listener in arrival order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use wallet_protocol::{
	AccountIdentity, AccountsResult, EndpointInfo, RequestEnvelope, RequestOrigin, SubscribeResult,
	SubscriptionId, SubscriptionUpdate, Transaction, TransactionResult, methods,
};

use crate::client::{AccountListener, WalletClient};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::transport::WebSocketTransport;

/// Wallet client speaking JSON-RPC over a WebSocket.
pub struct RpcWalletClient {
	endpoint: String,
	inner: Arc<Inner>,
}

struct Inner {
	origin: Mutex<RequestOrigin>,
	connection: Mutex<Option<Arc<Connection>>>,
	listeners: Mutex<Vec<AccountListener>>,
	subscription: Mutex<Option<SubscriptionId>>,
	/// Guards against opening two remote subscriptions at once
	subscribing: AtomicBool,
}

impl RpcWalletClient {
	/// Creates a client bound to `endpoint`. No connection is opened yet.
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self {
			endpoint: endpoint.into(),
			inner: Arc::new(Inner {
				origin: Mutex::new(RequestOrigin::default()),
				connection: Mutex::new(None),
				listeners: Mutex::new(Vec::new()),
				subscription: Mutex::new(None),
				subscribing: AtomicBool::new(false),
			}),
		}
	}

	/// Returns the RPC endpoint this client dials.
	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}

	/// Returns true while the channel to the wallet is open.
	pub fn is_connected(&self) -> bool {
		self.inner.live_connection().is_ok()
	}

	async fn open(&self) -> Result<()> {
		if self.is_connected() {
			tracing::debug!(endpoint = %self.endpoint, "Wallet channel already open");
			return Ok(());
		}

		let (transport, message_rx) = WebSocketTransport::connect(&self.endpoint).await?;
		let connection = Arc::new(Connection::new(transport.into_transport_parts(message_rx)));

		let weak = Arc::downgrade(&self.inner);
		connection.on_notification(
			methods::SUBSCRIPTION,
			Arc::new(move |params| Inner::handle_subscription_update(&weak, params)),
		);

		let loop_conn = Arc::clone(&connection);
		tokio::spawn(async move {
			loop_conn.run().await;
		});

		*self.inner.subscription.lock() = None;
		*self.inner.connection.lock() = Some(Arc::clone(&connection));
		tracing::info!(endpoint = %self.endpoint, "Connected to wallet");

		if !self.inner.listeners.lock().is_empty() {
			if let Err(e) = Inner::subscribe_current_account(&self.inner).await {
				connection.close();
				self.inner.connection.lock().take();
				return Err(e);
			}
		}
		Ok(())
	}

	async fn shutdown(&self) -> Result<()> {
		let connection = self.inner.connection.lock().clone().ok_or(Error::NotConnected)?;

		if connection.is_closed() {
			// The wallet dropped the channel, or close already ran.
			self.inner.subscription.lock().take();
			tracing::debug!(endpoint = %self.endpoint, "Wallet channel already closed");
			return Ok(());
		}

		let subscription = self.inner.subscription.lock().take();
		if let Some(id) = subscription {
			let unsubscribe = self
				.inner
				.call::<_, Value>(methods::UNSUBSCRIBE, json!({ "subscriptionId": &id }))
				.await;
			if let Err(e) = unsubscribe {
				tracing::debug!(subscription = %id, "Unsubscribe before close failed: {}", e);
			}
		}

		// The spent connection stays in place so a repeated close is a no-op.
		connection.close();
		tracing::info!(endpoint = %self.endpoint, "Closed wallet channel");
		Ok(())
	}
}

impl Inner {
	fn live_connection(&self) -> Result<Arc<Connection>> {
		self.connection
			.lock()
			.as_ref()
			.filter(|conn| !conn.is_closed())
			.cloned()
			.ok_or(Error::NotConnected)
	}

	async fn call<P: Serialize, R: DeserializeOwned>(&self, method: &str, payload: P) -> Result<R> {
		let connection = self.live_connection()?;
		let origin = self.origin.lock().clone();
		let params = serde_json::to_value(RequestEnvelope::new(origin, payload))?;
		let result = connection.send_request(method, params).await?;
		serde_json::from_value(result).map_err(Into::into)
	}

	async fn subscribe_current_account(self: &Arc<Self>) -> Result<()> {
		if self.subscription.lock().is_some() {
			return Ok(());
		}
		if self
			.subscribing
			.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
			.is_err()
		{
			return Ok(());
		}

		let result = self
			.call::<_, SubscribeResult>(methods::SUBSCRIBE_CURRENT_ACCOUNT, json!({}))
			.await;
		self.subscribing.store(false, Ordering::SeqCst);

		let SubscribeResult { subscription_id } = result?;
		tracing::debug!(subscription = %subscription_id, "Subscribed to current account");
		*self.subscription.lock() = Some(subscription_id);
		Ok(())
	}

	fn handle_subscription_update(weak: &Weak<Self>, params: Value) {
		let Some(inner) = weak.upgrade() else {
			return;
		};

		let update: SubscriptionUpdate = match serde_json::from_value(params) {
			Ok(update) => update,
			Err(e) => {
				tracing::warn!("Malformed subscription update: {}", e);
				return;
			}
		};

		// The id is only unknown while the subscribe response is in flight.
		let expected = inner.subscription.lock().clone();
		if expected.is_some_and(|id| id != update.subscription_id) {
			tracing::debug!(
				subscription = %update.subscription_id,
				"Update for foreign subscription (ignored)"
			);
			return;
		}

		let account: AccountIdentity = match serde_json::from_value(update.data) {
			Ok(account) => account,
			Err(e) => {
				tracing::warn!("Malformed account in subscription update: {}", e);
				return;
			}
		};

		let listeners = inner.listeners.lock().clone();
		for listener in listeners {
			listener(account.clone());
		}
	}
}

impl WalletClient for RpcWalletClient {
	fn connect(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(self.open())
	}

	fn close(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(self.shutdown())
	}

	fn get_endpoint(&self) -> BoxFuture<'_, Result<EndpointInfo>> {
		Box::pin(
			self.inner
				.call::<_, EndpointInfo>(methods::GET_ENDPOINT, json!({})),
		)
	}

	fn get_accounts(&self) -> BoxFuture<'_, Result<Vec<AccountIdentity>>> {
		Box::pin(async move {
			let AccountsResult { accounts } = self
				.inner
				.call::<_, AccountsResult>(methods::GET_ACCOUNTS, json!({}))
				.await?;
			Ok(accounts)
		})
	}

	fn send_transaction(
		&self,
		transaction: Transaction,
	) -> BoxFuture<'_, Result<TransactionResult>> {
		Box::pin(async move {
			self.inner
				.call::<_, TransactionResult>(methods::SEND_TRANSACTION, transaction)
				.await
		})
	}

	fn on_current_account_change(&self, listener: AccountListener) {
		self.inner.listeners.lock().push(listener);

		if self.inner.live_connection().is_err() {
			tracing::debug!("Account listener registered; subscribing on next connect");
			return;
		}

		match tokio::runtime::Handle::try_current() {
			Ok(handle) => {
				let inner = Arc::clone(&self.inner);
				handle.spawn(async move {
					if let Err(e) = Inner::subscribe_current_account(&inner).await {
						tracing::warn!("Failed to subscribe to current account: {}", e);
					}
				});
			}
			Err(_) => {
				tracing::debug!("No runtime available; subscribing on next connect");
			}
		}
	}

	fn set_origin(&self, origin: RequestOrigin) {
		tracing::debug!(origin = %origin.name, "Setting request origin");
		*self.inner.origin.lock() = origin;
	}
}

impl std::fmt::Debug for RpcWalletClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RpcWalletClient")
			.field("endpoint", &self.endpoint)
			.field("connected", &self.is_connected())
			.finish()
	}
}
