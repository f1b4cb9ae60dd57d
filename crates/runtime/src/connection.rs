//! JSON-RPC connection layer for the wallet protocol
//!
//! This module implements the request/response correlation layer on top of the transport.
//! It handles:
//! - Generating unique request IDs
//! - Correlating responses with pending requests
//! - Distinguishing notifications from responses
//! - Dispatching notifications to handlers registered per method
//!
//! # Message Flow
//!
//! 1. Client calls `send_request()` with method and params
//! 2. Connection generates unique ID and creates oneshot channel
//! 3. Request is serialized and queued for the writer task
//! 4. Client awaits on the oneshot receiver
//! 5. Message loop receives response from transport
//! 6. Response is correlated by ID and sent via oneshot channel
//! 7. Client receives result
//!
//! When the transport ends, every request still pending fails with
//! [`Error::ChannelClosed`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use wallet_protocol::{RpcErrorObject, RpcMessage, RpcRequest};

use crate::error::{Error, Result};
use crate::transport::{Transport, TransportParts, TransportReceiver};

/// Callback invoked with the params of every notification for one method.
pub type NotificationHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// Pending request callbacks keyed by request ID.
type CallbackMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>>;

enum Outbound {
	Message(Value),
	Close,
}

/// RAII guard ensuring callback cleanup when a request future is dropped.
struct CancelGuard {
	id: u64,
	callbacks: CallbackMap,
	completed: bool,
}

impl CancelGuard {
	fn new(id: u64, callbacks: CallbackMap) -> Self {
		Self {
			id,
			callbacks,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}
		if self.callbacks.lock().remove(&self.id).is_some() {
			tracing::debug!(id = self.id, "CancelGuard: removed orphaned callback");
		}
	}
}

/// Future returned by [`Connection::send_request`] with automatic cancellation cleanup.
struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.complete();
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// JSON-RPC connection to the wallet
///
/// Manages request/response correlation and notification dispatch.
/// Uses sequential request IDs and oneshot channels for correlation.
pub struct Connection {
	/// Sequential request ID counter
	last_id: AtomicU64,
	/// Pending request callbacks keyed by request ID
	callbacks: CallbackMap,
	/// Channel for sending outbound messages to the writer task
	outbound_tx: mpsc::UnboundedSender<Outbound>,
	/// Set once the message loop has ended
	closed: AtomicBool,
	/// Transport halves and queues, taken by run()
	parts: Mutex<Option<RunParts>>,
	/// Notification handlers keyed by notification method
	handlers: Mutex<HashMap<String, NotificationHandler>>,
}

struct RunParts {
	sender: Box<dyn Transport>,
	receiver: Box<dyn TransportReceiver>,
	message_rx: mpsc::UnboundedReceiver<Value>,
	outbound_rx: mpsc::UnboundedReceiver<Outbound>,
}

impl Connection {
	/// Create a new Connection with the given transport
	pub fn new(parts: TransportParts) -> Self {
		let TransportParts {
			sender,
			receiver,
			message_rx,
		} = parts;

		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

		Self {
			last_id: AtomicU64::new(0),
			callbacks: Arc::new(Mutex::new(HashMap::new())),
			outbound_tx,
			closed: AtomicBool::new(false),
			parts: Mutex::new(Some(RunParts {
				sender,
				receiver,
				message_rx,
				outbound_rx,
			})),
			handlers: Mutex::new(HashMap::new()),
		}
	}

	/// Registers the handler for notifications named `method`, replacing any previous one.
	pub fn on_notification(&self, method: &str, handler: NotificationHandler) {
		self.handlers.lock().insert(method.to_string(), handler);
	}

	/// Returns true once the message loop has ended or `close()` was called.
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	/// Sends a request to the wallet and awaits the response.
	pub async fn send_request(&self, method: &str, params: Value) -> Result<Value> {
		if self.is_closed() {
			return Err(Error::ChannelClosed);
		}

		let id = self.last_id.fetch_add(1, Ordering::SeqCst);
		tracing::debug!(id, %method, "Sending wallet request");

		let (tx, rx) = oneshot::channel();
		self.callbacks.lock().insert(id, tx);

		let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

		// The loop may have drained callbacks between the check above and the insert.
		if self.is_closed() {
			return Err(Error::ChannelClosed);
		}

		let request = serde_json::to_value(RpcRequest::new(id, method, params))?;
		if self.outbound_tx.send(Outbound::Message(request)).is_err() {
			tracing::error!("Failed to queue message: outbound channel closed");
			return Err(Error::ChannelClosed);
		}

		ResponseFuture { rx, guard }.await
	}

	/// Asks the writer to close the socket.
	///
	/// Pending requests fail with [`Error::ChannelClosed`] once the wallet
	/// acknowledges the close and the message loop ends.
	pub fn close(&self) {
		self.closed.store(true, Ordering::SeqCst);
		let _ = self.outbound_tx.send(Outbound::Close);
	}

	/// Run the message dispatch loop until the transport ends.
	pub async fn run(self: &Arc<Self>) {
		let Some(parts) = self.parts.lock().take() else {
			tracing::error!("Connection::run() called twice; transport already taken");
			return;
		};
		let RunParts {
			mut sender,
			receiver,
			mut message_rx,
			mut outbound_rx,
		} = parts;

		let reader_handle = tokio::spawn(async move {
			if let Err(e) = receiver.run().await {
				tracing::error!("Transport read error: {}", e);
			}
		});

		let writer_handle = tokio::spawn(async move {
			while let Some(outbound) = outbound_rx.recv().await {
				match outbound {
					Outbound::Message(message) => {
						if let Err(e) = sender.send(message).await {
							tracing::error!("Transport write error: {}", e);
							break;
						}
					}
					Outbound::Close => {
						if let Err(e) = sender.close().await {
							tracing::debug!("Close handshake failed: {}", e);
						}
						break;
					}
				}
			}
		});

		while let Some(message_value) = message_rx.recv().await {
			match serde_json::from_value::<RpcMessage>(message_value) {
				Ok(message) => {
					if let Err(e) = self.dispatch_internal(message) {
						tracing::error!("Error dispatching message: {}", e);
					}
				}
				Err(e) => {
					tracing::error!("Failed to parse message: {}", e);
				}
			}
		}

		self.closed.store(true, Ordering::SeqCst);
		writer_handle.abort();
		let _ = writer_handle.await;
		let _ = reader_handle.await;

		let pending: Vec<_> = self.callbacks.lock().drain().collect();
		if !pending.is_empty() {
			tracing::debug!(count = pending.len(), "Failing requests pending at close");
		}
		for (_, callback) in pending {
			let _ = callback.send(Err(Error::ChannelClosed));
		}
		tracing::debug!("Wallet connection loop ended");
	}

	/// Dispatch an incoming message (test-only public version)
	#[cfg(test)]
	pub fn dispatch(&self, message: RpcMessage) -> Result<()> {
		self.dispatch_internal(message)
	}

	fn dispatch_internal(&self, message: RpcMessage) -> Result<()> {
		match message {
			RpcMessage::Response(response) => {
				let callback = self.callbacks.lock().remove(&response.id).ok_or_else(|| {
					Error::Protocol(format!(
						"Cannot find request to respond: id={}",
						response.id
					))
				})?;

				let result = match response.error {
					Some(error) => Err(parse_rpc_error(error)),
					None => Ok(response.result.unwrap_or(Value::Null)),
				};

				let _ = callback.send(result);
				Ok(())
			}
			RpcMessage::Notification(notification) => {
				let handler = self.handlers.lock().get(&notification.method).cloned();
				match handler {
					Some(handler) => handler(notification.params),
					None => tracing::debug!(
						method = %notification.method,
						"Notification without handler (ignored)"
					),
				}
				Ok(())
			}
			RpcMessage::Unknown(value) => {
				tracing::debug!("Unknown message type (forward-compatible, ignored): {}", value);
				Ok(())
			}
		}
	}
}

/// Converts a JSON-RPC error object into [`Error::Remote`].
fn parse_rpc_error(error: RpcErrorObject) -> Error {
	Error::Remote {
		code: error.code,
		message: error.message,
	}
}
