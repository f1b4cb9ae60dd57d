// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0

//! Session error types.

use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors returned by [`WalletSession`](crate::WalletSession) operations.
///
/// Guard failures ([`NotInitialized`](Self::NotInitialized),
/// [`NotConnected`](Self::NotConnected)) are raised before any RPC call is
/// issued and before any state changes. Client failures are passed through
/// unchanged and leave the session in its prior state.
#[derive(Debug, Error)]
pub enum SessionError {
	/// Operation requires a client but `initialize()` has not run.
	#[error("Wallet session is not initialized")]
	NotInitialized,

	/// Operation requires an open connection to the wallet.
	#[error("Wallet session is not connected to the wallet")]
	NotConnected,

	/// The wallet client reported a failure.
	#[error(transparent)]
	Client(#[from] wallet_runtime::Error),
}

impl SessionError {
	/// Returns true for errors raised by a readiness guard.
	pub fn is_guard_failure(&self) -> bool {
		matches!(self, SessionError::NotInitialized | SessionError::NotConnected)
	}

	/// Returns the underlying client error, if any.
	pub fn client_error(&self) -> Option<&wallet_runtime::Error> {
		match self {
			SessionError::Client(e) => Some(e),
			_ => None,
		}
	}
}
