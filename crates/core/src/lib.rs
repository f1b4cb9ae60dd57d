// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0

//! wallet: Client-side session manager for a local wallet process
//!
//! This crate tracks an application's session with a wallet reachable over
//! RPC: whether a client exists, whether it is connected, the endpoint the
//! wallet reported, the wallet's current account, and the last fetched
//! account list.
//!
//! State lives in a [`SessionStore`] and changes only through
//! [`SessionEvent`]s applied by the pure [`reduce`] function.
//! [`WalletSession`] is the controller: it checks readiness, drives the
//! [`WalletClient`], and emits events for successful responses.
//!
//! # Example
//!
//! ```ignore
//! use wallet::{RequestOrigin, SessionConfig, WalletSession};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::from_env(RequestOrigin::new("My dApp"))
//!         .with_auto_initialize(true);
//!     let session = WalletSession::new(config);
//!
//!     let _sub = session.on_change(|snapshot| {
//!         println!("connected={} account={:?}", snapshot.connected, snapshot.current_account);
//!     });
//!
//!     session.connect().await?;
//!     let accounts = session.get_accounts().await?;
//!     println!("{} accounts", accounts.len());
//!
//!     let result = session
//!         .send_transaction(json!({"type": "transfer", "amount": 10}))
//!         .await?;
//!     println!("sent {}", result.transaction_address);
//!
//!     session.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod factory;
pub mod listeners;
pub mod store;

pub use config::{AUTO_INITIALIZE_ENV, ENDPOINT_ENV, SessionConfig};
pub use controller::WalletSession;
pub use error::{Result, SessionError};
pub use factory::{ClientFactory, RpcClientFactory};
pub use listeners::{ListenerId, Subscription};
pub use store::{Session, SessionEvent, SessionSnapshot, SessionStore, reduce};

pub use wallet_protocol::{
	AccountIdentity, EndpointInfo, RequestOrigin, Transaction, TransactionResult,
};
pub use wallet_runtime::{AccountListener, DEFAULT_WALLET_ENDPOINT, WalletClient};

/// Re-exported so callers can match on client failures.
pub use wallet_runtime::Error as ClientError;
