//! Error types for the wallet runtime.

use thiserror::Error;
use wallet_protocol::USER_REJECTED;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the wallet client.
#[derive(Debug, Error)]
pub enum Error {
	/// Failed to establish the channel to the wallet.
	#[error("Failed to connect to wallet at {endpoint}: {reason}")]
	ConnectionFailed { endpoint: String, reason: String },

	/// Transport-level error (WebSocket read/write).
	#[error("Transport error: {0}")]
	Transport(String),

	/// Protocol-level error (malformed or unexpected JSON-RPC traffic).
	#[error("Protocol error: {0}")]
	Protocol(String),

	/// Error object returned by the wallet.
	#[error("Wallet error {code}: {message}")]
	Remote {
		/// JSON-RPC error code
		code: i64,
		/// Human-readable error message
		message: String,
	},

	/// A call was issued while the client has no open channel.
	#[error("Wallet client is not connected")]
	NotConnected,

	/// Channel closed while a request was in flight.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns the JSON-RPC error code if this is a Remote error.
	pub fn error_code(&self) -> Option<i64> {
		match self {
			Error::Remote { code, .. } => Some(*code),
			_ => None,
		}
	}

	/// Returns true if the user declined the request in the wallet.
	pub fn is_user_rejection(&self) -> bool {
		self.error_code() == Some(USER_REJECTED)
	}

	/// Returns true if the channel to the wallet is gone.
	pub fn is_disconnected(&self) -> bool {
		matches!(self, Error::NotConnected | Error::ChannelClosed)
	}
}
