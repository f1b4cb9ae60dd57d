// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0

use wallet_protocol::RequestOrigin;
use wallet_runtime::DEFAULT_WALLET_ENDPOINT;

/// Environment variable overriding the wallet RPC endpoint.
pub const ENDPOINT_ENV: &str = "WALLET_RPC_ENDPOINT";

/// Environment variable enabling auto-initialization (`1` or `true`).
pub const AUTO_INITIALIZE_ENV: &str = "WALLET_AUTO_INITIALIZE";

/// Fully owned wallet-session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
	/// RPC endpoint the client is bound to.
	pub endpoint: String,
	/// Origin descriptor forwarded verbatim to the wallet.
	pub origin: RequestOrigin,
	/// Whether the session calls `initialize()` when it is created.
	pub auto_initialize: bool,
}

impl SessionConfig {
	/// Creates a config for `origin` with the default local endpoint and no auto-start.
	pub fn new(origin: RequestOrigin) -> Self {
		Self {
			endpoint: DEFAULT_WALLET_ENDPOINT.to_string(),
			origin,
			auto_initialize: false,
		}
	}

	/// Creates a config for `origin`, applying overrides from the process environment.
	pub fn from_env(origin: RequestOrigin) -> Self {
		Self::new(origin).with_overrides(|key| std::env::var(key).ok())
	}

	/// Sets the RPC endpoint.
	pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = endpoint.into();
		self
	}

	/// Sets whether the session initializes itself on creation.
	pub fn with_auto_initialize(mut self, auto_initialize: bool) -> Self {
		self.auto_initialize = auto_initialize;
		self
	}

	fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
		if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
			self.endpoint = endpoint.trim().to_string();
		}
		if let Some(flag) = lookup(AUTO_INITIALIZE_ENV) {
			self.auto_initialize = parse_flag(&flag);
		}
		self
	}
}

fn parse_flag(value: &str) -> bool {
	matches!(
		value.trim().to_ascii_lowercase().as_str(),
		"1" | "true" | "yes" | "on"
	)
}
