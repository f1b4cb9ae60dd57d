//! Wire types for the wallet RPC protocol.
//!
//! This crate contains the serde-serializable types exchanged with the
//! wallet process over JSON-RPC. These types represent the "protocol
//! layer" - the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization/deserialization
//! - **Opaque where the session is concerned**: Account identities and
//!   transaction payloads are carried, never interpreted
//! - **Stable**: Changes only when the wire protocol changes
//!
//! The client and session layers are built on top of these types in
//! `wallet-runtime` and `wallet-session`.

pub mod rpc;
pub mod types;

pub use rpc::*;
pub use types::*;
