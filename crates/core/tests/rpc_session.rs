//! WalletSession over the real RPC client against an in-process wallet.

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use wallet::{AccountIdentity, RequestOrigin, SessionConfig, SessionError, WalletSession};

use common::{WALLET_ENDPOINT_URL, init_tracing};

/// Starts a wallet that serves one connection until `hang_up` fires, then
/// drops the socket without a close handshake.
async fn start_wallet() -> (String, oneshot::Sender<()>) {
	init_tracing();

	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let (hang_up_tx, mut hang_up_rx) = oneshot::channel::<()>();

	tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
		let (mut tx, mut rx) = ws.split();

		loop {
			tokio::select! {
				frame = rx.next() => {
					let Some(Ok(Message::Text(text))) = frame else { break };
					let request: Value = serde_json::from_str(&text).unwrap();
					let result = match request["method"].as_str() {
						Some("getEndpoint") => json!({"endpointUrl": WALLET_ENDPOINT_URL}),
						Some("getAccounts") => json!({"accounts": [{"address": "0xA"}]}),
						Some("subscribeCurrentAccount") => json!({"subscriptionId": "sub-1"}),
						_ => json!({}),
					};
					let reply = json!({"jsonrpc": "2.0", "id": request["id"], "result": result});
					if tx.send(Message::Text(reply.to_string())).await.is_err() {
						break;
					}
				}
				_ = &mut hang_up_rx => break,
			}
		}
	});

	(format!("ws://{}", addr), hang_up_tx)
}

#[tokio::test]
async fn session_connects_and_fetches_accounts_over_rpc() -> anyhow::Result<()> {
	let (url, _hang_up) = start_wallet().await;
	let session = WalletSession::new(
		SessionConfig::new(RequestOrigin::new("My dApp"))
			.with_endpoint(url)
			.with_auto_initialize(true),
	);

	session.connect().await?;
	assert_eq!(
		session.snapshot().endpoint_url.as_deref(),
		Some(WALLET_ENDPOINT_URL)
	);
	assert_eq!(session.get_accounts().await?, vec![AccountIdentity::new("0xA")]);

	session.disconnect().await?;
	assert!(!session.is_connected());
	Ok(())
}

#[tokio::test]
async fn disconnect_succeeds_after_wallet_drops_the_socket() -> anyhow::Result<()> {
	let (url, hang_up) = start_wallet().await;
	let session = WalletSession::new(
		SessionConfig::new(RequestOrigin::new("My dApp"))
			.with_endpoint(url)
			.with_auto_initialize(true),
	);
	session.connect().await?;

	let _ = hang_up.send(());
	// Calls fail once the client notices the dropped channel.
	tokio::time::timeout(Duration::from_secs(5), async {
		while session.get_accounts().await.is_ok() {
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
	})
	.await?;

	session.disconnect().await?;
	let snapshot = session.snapshot();
	assert!(!snapshot.connected);
	assert!(snapshot.current_account.is_none());

	let err = session.disconnect().await.unwrap_err();
	assert!(matches!(err, SessionError::NotConnected), "{:?}", err);
	Ok(())
}
