// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0

use std::sync::Arc;

use wallet_runtime::{RpcWalletClient, WalletClient};

/// Creates the wallet client a session drives.
///
/// Closures of the form `Fn(&str) -> Arc<dyn WalletClient>` implement this
/// trait, which is how tests inject a fake client.
pub trait ClientFactory: Send + Sync {
	/// Returns a new client bound to `endpoint`.
	fn create(&self, endpoint: &str) -> Arc<dyn WalletClient>;
}

/// Factory for the production [`RpcWalletClient`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RpcClientFactory;

impl ClientFactory for RpcClientFactory {
	fn create(&self, endpoint: &str) -> Arc<dyn WalletClient> {
		Arc::new(RpcWalletClient::new(endpoint))
	}
}

impl<F> ClientFactory for F
where
	F: Fn(&str) -> Arc<dyn WalletClient> + Send + Sync,
{
	fn create(&self, endpoint: &str) -> Arc<dyn WalletClient> {
		self(endpoint)
	}
}
