//! Wallet Runtime - RPC client, connection, and transport
//!
//! This crate provides the client-side infrastructure for talking to a
//! wallet process over RPC:
//!
//! - **Client trait**: [`WalletClient`], the surface the session layer drives
//! - **Transport**: Bidirectional JSON messages over a WebSocket
//! - **Connection**: JSON-RPC request/response correlation and notification dispatch
//! - **RpcWalletClient**: The production client bound to the local wallet endpoint
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐
//! │ wallet-session │  Session store and controller
//! └───────┬────────┘
//!         │ drives dyn WalletClient
//! ┌───────▼────────┐
//! │ wallet-runtime │  This crate
//! │  ┌──────────┐  │
//! │  │ RpcWallet│  │  Origin envelopes, subscriptions
//! │  └──────────┘  │
//! │  ┌──────────┐  │
//! │  │ Conn     │  │  JSON-RPC correlation
//! │  └──────────┘  │
//! │  ┌──────────┐  │
//! │  │ Trans    │  │  WebSocket transport
//! │  └──────────┘  │
//! └────────────────┘
//! ```

pub mod client;
pub mod connection;
pub mod error;
pub mod rpc_wallet;
pub mod transport;

// Re-export key types at crate root
pub use client::{AccountListener, DEFAULT_WALLET_ENDPOINT, WalletClient};
pub use connection::{Connection, NotificationHandler};
pub use error::{Error, Result};
pub use rpc_wallet::RpcWalletClient;
pub use transport::{
	Transport, TransportParts, TransportReceiver, WebSocketTransport, WebSocketTransportReceiver,
	WebSocketTransportSender,
};
pub use wallet_protocol as protocol;
