//! In-process wallet speaking the JSON-RPC protocol over a WebSocket.

use std::sync::{Arc, Once};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

pub const WALLET_ENDPOINT_URL: &str = "ws://127.0.0.1:9999";
pub const SUBSCRIPTION_ID: &str = "sub-1";

static TRACING: Once = Once::new();

/// Installs a test subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
	TRACING.call_once(|| {
		let _ = tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_test_writer()
			.try_init();
	});
}

enum Push {
	Frame(Value),
	HangUp,
}

/// Handle to a running fake wallet.
pub struct FakeWallet {
	pub url: String,
	/// Every request the wallet received, in arrival order
	pub requests: Arc<Mutex<Vec<Value>>>,
	push_tx: mpsc::UnboundedSender<Push>,
	pub task: JoinHandle<()>,
}

impl FakeWallet {
	/// Starts a wallet that serves a single client connection.
	pub async fn start() -> Self {
		init_tracing();

		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		let requests = Arc::new(Mutex::new(Vec::new()));
		let (push_tx, push_rx) = mpsc::unbounded_channel();

		let log = Arc::clone(&requests);
		let task = tokio::spawn(async move {
			let (stream, _) = listener.accept().await.unwrap();
			let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
			serve(ws, log, push_rx).await;
		});

		Self {
			url: format!("ws://{}", addr),
			requests,
			push_tx,
			task,
		}
	}

	/// Pushes a current-account update to the connected client.
	pub fn push_account(&self, account: Value) {
		self.push_raw(json!({
			"jsonrpc": "2.0",
			"method": "subscription",
			"params": {"subscriptionId": SUBSCRIPTION_ID, "data": account}
		}));
	}

	/// Pushes a raw notification.
	pub fn push_raw(&self, notification: Value) {
		self.push_tx.send(Push::Frame(notification)).unwrap();
	}

	/// Drops the socket without a close handshake.
	pub fn hang_up(&self) {
		self.push_tx.send(Push::HangUp).unwrap();
	}

	/// Names of the methods called so far.
	pub fn methods(&self) -> Vec<String> {
		self.requests
			.lock()
			.iter()
			.filter_map(|r| r["method"].as_str().map(String::from))
			.collect()
	}
}

async fn serve(
	ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
	log: Arc<Mutex<Vec<Value>>>,
	mut push_rx: mpsc::UnboundedReceiver<Push>,
) {
	let (mut tx, mut rx) = ws.split();

	loop {
		tokio::select! {
			frame = rx.next() => {
				let Some(Ok(frame)) = frame else { break };
				let text = match frame {
					Message::Text(text) => text,
					Message::Close(_) => break,
					_ => continue,
				};
				let request: Value = serde_json::from_str(&text).unwrap();
				log.lock().push(request.clone());
				let reply = respond(&request);
				if tx.send(Message::Text(reply.to_string())).await.is_err() {
					break;
				}
			}
			Some(push) = push_rx.recv() => {
				let Push::Frame(push) = push else { break };
				if tx.send(Message::Text(push.to_string())).await.is_err() {
					break;
				}
			}
		}
	}
}

fn respond(request: &Value) -> Value {
	let id = request["id"].clone();
	let payload = &request["params"]["payload"];

	let outcome = match request["method"].as_str().unwrap_or_default() {
		"getEndpoint" => Ok(json!({"endpointUrl": WALLET_ENDPOINT_URL})),
		"getAccounts" => Ok(json!({"accounts": [
			{"address": "0xA", "name": "main"},
			{"address": "0xC"}
		]})),
		"sendTransaction" if payload["reject"] == true => Err((4001, "User rejected")),
		"sendTransaction" => Ok(json!({
			"transactionAddress": "0000feed",
			"nbConfirmations": 1,
			"maxConfirmations": 3
		})),
		"subscribeCurrentAccount" => Ok(json!({"subscriptionId": SUBSCRIPTION_ID})),
		"unsubscribe" => Ok(json!({})),
		_ => Err((-32601, "Method not found")),
	};

	match outcome {
		Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
		Err((code, message)) => {
			json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
		}
	}
}
