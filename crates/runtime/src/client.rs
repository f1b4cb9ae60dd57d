//! The wallet client surface the session layer drives.
//!
//! [`WalletClient`] is deliberately small: it is everything the session
//! needs from the wallet and nothing more. [`RpcWalletClient`] is the
//! production implementation; tests substitute their own.
//!
//! [`RpcWalletClient`]: crate::rpc_wallet::RpcWalletClient

use std::sync::Arc;

use futures_util::future::BoxFuture;
use wallet_protocol::{AccountIdentity, EndpointInfo, RequestOrigin, Transaction, TransactionResult};

use crate::error::Result;

/// Local loopback address the wallet listens on.
pub const DEFAULT_WALLET_ENDPOINT: &str = "ws://localhost:12345";

/// Callback invoked whenever the wallet reports a new current account.
pub type AccountListener = Arc<dyn Fn(AccountIdentity) + Send + Sync>;

/// Client for a wallet process reachable over RPC.
///
/// All network operations are asynchronous and never retried; failures
/// are returned as-is.
pub trait WalletClient: Send + Sync {
	/// Opens the channel to the wallet.
	fn connect(&self) -> BoxFuture<'_, Result<()>>;

	/// Closes the channel to the wallet.
	fn close(&self) -> BoxFuture<'_, Result<()>>;

	/// Returns the network endpoint the wallet is bound to.
	fn get_endpoint(&self) -> BoxFuture<'_, Result<EndpointInfo>>;

	/// Returns every account the wallet exposes to this origin.
	fn get_accounts(&self) -> BoxFuture<'_, Result<Vec<AccountIdentity>>>;

	/// Asks the wallet to sign and send `transaction`.
	fn send_transaction(&self, transaction: Transaction)
	-> BoxFuture<'_, Result<TransactionResult>>;

	/// Registers a persistent listener for current-account changes.
	///
	/// Listeners stay registered for the lifetime of the client.
	fn on_current_account_change(&self, listener: AccountListener);

	/// Sets the origin descriptor sent with every request.
	fn set_origin(&self, origin: RequestOrigin);
}
