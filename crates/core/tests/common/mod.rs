//! Recording wallet client and factory for controller tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Once};

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use wallet::{
	AccountIdentity, AccountListener, ClientError, ClientFactory, EndpointInfo, RequestOrigin,
	Transaction, TransactionResult, WalletClient,
};

pub const WALLET_ENDPOINT_URL: &str = "ws://127.0.0.1:9999";

static TRACING: Once = Once::new();

/// Installs a test subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
	TRACING.call_once(|| {
		let _ = tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_test_writer()
			.try_init();
	});
}

/// Wallet client that records every call and answers from canned data.
pub struct MockWalletClient {
	pub endpoint: String,
	reported_endpoint: Mutex<String>,
	calls: Mutex<Vec<&'static str>>,
	origin: Mutex<Option<RequestOrigin>>,
	accounts: Mutex<Vec<AccountIdentity>>,
	failing: Mutex<HashSet<&'static str>>,
	listeners: Mutex<Vec<AccountListener>>,
	transactions: Mutex<Vec<Transaction>>,
}

impl MockWalletClient {
	pub fn new(endpoint: &str) -> Self {
		Self {
			endpoint: endpoint.to_string(),
			reported_endpoint: Mutex::new(WALLET_ENDPOINT_URL.to_string()),
			calls: Mutex::new(Vec::new()),
			origin: Mutex::new(None),
			accounts: Mutex::new(vec![AccountIdentity::new("0xA")]),
			failing: Mutex::new(HashSet::new()),
			listeners: Mutex::new(Vec::new()),
			transactions: Mutex::new(Vec::new()),
		}
	}

	/// Makes `method` fail from now on.
	pub fn fail_on(&self, method: &'static str) {
		self.failing.lock().insert(method);
	}

	/// Sets the endpoint `get_endpoint` reports.
	pub fn set_reported_endpoint(&self, endpoint_url: &str) {
		*self.reported_endpoint.lock() = endpoint_url.to_string();
	}

	pub fn set_accounts(&self, accounts: Vec<AccountIdentity>) {
		*self.accounts.lock() = accounts;
	}

	/// RPC methods called so far, in order.
	pub fn calls(&self) -> Vec<&'static str> {
		self.calls.lock().clone()
	}

	pub fn origin(&self) -> Option<RequestOrigin> {
		self.origin.lock().clone()
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.lock().len()
	}

	pub fn transactions(&self) -> Vec<Transaction> {
		self.transactions.lock().clone()
	}

	/// Delivers `account` to every registered listener, as a wallet push would.
	pub fn fire_account_change(&self, account: AccountIdentity) {
		let listeners = self.listeners.lock().clone();
		for listener in listeners {
			listener(account.clone());
		}
	}

	fn record(&self, method: &'static str) -> Result<(), ClientError> {
		self.calls.lock().push(method);
		if self.failing.lock().contains(method) {
			let code = if method == "send_transaction" { 4001 } else { -32000 };
			return Err(ClientError::Remote {
				code,
				message: format!("{} failed", method),
			});
		}
		Ok(())
	}
}

impl WalletClient for MockWalletClient {
	fn connect(&self) -> BoxFuture<'_, wallet_runtime::Result<()>> {
		Box::pin(async move { self.record("connect") })
	}

	fn close(&self) -> BoxFuture<'_, wallet_runtime::Result<()>> {
		Box::pin(async move { self.record("close") })
	}

	fn get_endpoint(&self) -> BoxFuture<'_, wallet_runtime::Result<EndpointInfo>> {
		Box::pin(async move {
			self.record("get_endpoint")?;
			Ok(EndpointInfo {
				endpoint_url: self.reported_endpoint.lock().clone(),
			})
		})
	}

	fn get_accounts(&self) -> BoxFuture<'_, wallet_runtime::Result<Vec<AccountIdentity>>> {
		Box::pin(async move {
			self.record("get_accounts")?;
			Ok(self.accounts.lock().clone())
		})
	}

	fn send_transaction(
		&self,
		transaction: Transaction,
	) -> BoxFuture<'_, wallet_runtime::Result<TransactionResult>> {
		Box::pin(async move {
			self.record("send_transaction")?;
			self.transactions.lock().push(transaction);
			Ok(TransactionResult {
				transaction_address: "0000feed".to_string(),
				nb_confirmations: 1,
				max_confirmations: 3,
			})
		})
	}

	fn on_current_account_change(&self, listener: AccountListener) {
		self.listeners.lock().push(listener);
	}

	fn set_origin(&self, origin: RequestOrigin) {
		*self.origin.lock() = Some(origin);
	}
}

/// Factory handing out a fresh [`MockWalletClient`] per call.
#[derive(Default)]
pub struct MockFactory {
	created: Mutex<Vec<Arc<MockWalletClient>>>,
}

impl MockFactory {
	pub fn new() -> Arc<Self> {
		init_tracing();
		Arc::new(Self::default())
	}

	/// Clients created so far, oldest first.
	pub fn created(&self) -> Vec<Arc<MockWalletClient>> {
		self.created.lock().clone()
	}

	/// Most recently created client.
	pub fn latest(&self) -> Arc<MockWalletClient> {
		self.created
			.lock()
			.last()
			.cloned()
			.expect("no client created yet")
	}
}

impl ClientFactory for MockFactory {
	fn create(&self, endpoint: &str) -> Arc<dyn WalletClient> {
		let client = Arc::new(MockWalletClient::new(endpoint));
		self.created.lock().push(Arc::clone(&client));
		client
	}
}
