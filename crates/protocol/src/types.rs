//! Core protocol types used across the wire.
//!
//! These types represent the values the wallet hands back to its callers.
//! Account identities and transaction payloads are opaque: the session
//! layer stores and forwards them but never looks inside.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A wallet account as reported by the wallet.
///
/// Only the address is named; everything else the wallet sends
/// (service name, key metadata, ...) is preserved in [`metadata`](Self::metadata)
/// so that a round trip through the session never loses fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
	/// Account address (genesis address on chains that have one)
	pub address: String,
	/// Human-readable account name
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Any additional fields reported by the wallet
	#[serde(flatten)]
	pub metadata: Map<String, Value>,
}

impl AccountIdentity {
	/// Creates an identity carrying only an address.
	pub fn new(address: impl Into<String>) -> Self {
		Self {
			address: address.into(),
			name: None,
			metadata: Map::new(),
		}
	}

	/// Sets the account name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}
}

/// Identifies the calling application to the wallet.
///
/// Forwarded verbatim with every request so the wallet can show the user
/// who is asking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOrigin {
	/// Application name shown in the wallet prompt
	pub name: String,
	/// Application URL
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	/// Application logo URL
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub logo: Option<String>,
}

impl RequestOrigin {
	/// Creates an origin with a name and no URL or logo.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			url: None,
			logo: None,
		}
	}

	/// Sets the application URL.
	pub fn with_url(mut self, url: impl Into<String>) -> Self {
		self.url = Some(url.into());
		self
	}

	/// Sets the application logo URL.
	pub fn with_logo(mut self, logo: impl Into<String>) -> Self {
		self.logo = Some(logo.into());
		self
	}
}

/// Network endpoint the wallet is currently bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointInfo {
	#[serde(rename = "endpointUrl")]
	pub endpoint_url: String,
}

/// Opaque transaction payload handed to the wallet for signing and sending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transaction(pub Value);

impl Transaction {
	/// Wraps a JSON payload.
	pub fn new(payload: Value) -> Self {
		Self(payload)
	}

	/// Returns the raw payload.
	pub fn payload(&self) -> &Value {
		&self.0
	}
}

impl From<Value> for Transaction {
	fn from(payload: Value) -> Self {
		Self(payload)
	}
}

/// Outcome of a transaction the wallet accepted and sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
	/// Address of the sent transaction
	pub transaction_address: String,
	/// Confirmations received so far
	pub nb_confirmations: u32,
	/// Confirmations required for finality
	pub max_confirmations: u32,
}

/// Identifier the wallet assigns to a push subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub String);

impl std::fmt::Display for SubscriptionId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}
