//! JSON-RPC 2.0 envelopes and wallet method names.
//!
//! Every wallet call is a JSON-RPC request whose `params` is a
//! [`RequestEnvelope`]: the caller's [`RequestOrigin`], the protocol
//! version, and the method-specific payload. Push updates (current account
//! changes) arrive as notifications carrying a [`SubscriptionId`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{AccountIdentity, RequestOrigin, SubscriptionId};

/// JSON-RPC version tag sent with every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// Wallet protocol version carried in [`RequestEnvelope::version`].
pub const PROTOCOL_VERSION: u32 = 1;

/// Error code the wallet uses when the user declines a request.
pub const USER_REJECTED: i64 = 4001;

/// Wallet method names.
pub mod methods {
	pub const GET_ENDPOINT: &str = "getEndpoint";
	pub const GET_ACCOUNTS: &str = "getAccounts";
	pub const SEND_TRANSACTION: &str = "sendTransaction";
	pub const SUBSCRIBE_CURRENT_ACCOUNT: &str = "subscribeCurrentAccount";
	pub const UNSUBSCRIBE: &str = "unsubscribe";
	/// Notification method for every subscription push.
	pub const SUBSCRIPTION: &str = "subscription";
}

/// Request message sent to the wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
	pub jsonrpc: String,
	/// Unique request ID for correlating responses
	pub id: u64,
	pub method: String,
	pub params: Value,
}

impl RpcRequest {
	pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
		Self {
			jsonrpc: JSONRPC_VERSION.to_string(),
			id,
			method: method.into(),
			params,
		}
	}
}

/// Response message from the wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
	/// Request ID this response correlates to
	pub id: u64,
	/// Success result (mutually exclusive with error)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	/// Error result (mutually exclusive with result)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<RpcErrorObject>,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

/// Server-initiated message with no `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcNotification {
	pub method: String,
	#[serde(default)]
	pub params: Value,
}

/// Discriminated union of inbound messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcMessage {
	/// Response message (has `id` field)
	Response(RpcResponse),
	/// Notification message (no `id` field)
	Notification(RpcNotification),
	/// Unknown message type (forward-compatible catch-all)
	Unknown(Value),
}

/// Parameters of every wallet request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope<P> {
	pub origin: RequestOrigin,
	pub version: u32,
	pub payload: P,
}

impl<P> RequestEnvelope<P> {
	pub fn new(origin: RequestOrigin, payload: P) -> Self {
		Self {
			origin,
			version: PROTOCOL_VERSION,
			payload,
		}
	}
}

/// Result of a [`methods::GET_ACCOUNTS`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsResult {
	pub accounts: Vec<AccountIdentity>,
}

/// Result of a `subscribe*` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeResult {
	#[serde(rename = "subscriptionId")]
	pub subscription_id: SubscriptionId,
}

/// Params of a [`methods::SUBSCRIPTION`] notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionUpdate {
	#[serde(rename = "subscriptionId")]
	pub subscription_id: SubscriptionId,
	pub data: Value,
}
