//! WebSocket transport to the wallet process.
//!
//! The transport is split into two halves so the connection can own the
//! read loop and the write path independently:
//!
//! - [`Transport`] sends one JSON value per WebSocket text frame
//! - [`TransportReceiver`] reads frames and forwards decoded JSON values
//!   into an unbounded channel until the socket closes

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of a transport.
pub trait Transport: Send {
	/// Sends one JSON message.
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

	/// Closes the write half, signalling the peer.
	fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Read half of a transport.
pub trait TransportReceiver: Send {
	/// Reads until the peer closes, forwarding every decoded message.
	fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}

/// Both halves of a transport plus the channel the receiver feeds.
pub struct TransportParts {
	pub sender: Box<dyn Transport>,
	pub receiver: Box<dyn TransportReceiver>,
	pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// WebSocket transport speaking JSON text frames.
pub struct WebSocketTransport {
	sender: WebSocketTransportSender,
	receiver: WebSocketTransportReceiver,
}

/// Write half of [`WebSocketTransport`].
pub struct WebSocketTransportSender {
	sink: SplitSink<WsStream, WsMessage>,
}

/// Read half of [`WebSocketTransport`].
pub struct WebSocketTransportReceiver {
	stream: SplitStream<WsStream>,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl WebSocketTransport {
	/// Opens a WebSocket to `url`.
	///
	/// Returns the transport and the receiver on which inbound messages
	/// arrive once [`TransportReceiver::run`] is driven.
	pub async fn connect(url: &str) -> Result<(Self, mpsc::UnboundedReceiver<Value>)> {
		tracing::debug!(%url, "Opening wallet websocket");
		let (ws, _response) = tokio_tungstenite::connect_async(url).await.map_err(|e| {
			Error::ConnectionFailed {
				endpoint: url.to_string(),
				reason: e.to_string(),
			}
		})?;

		let (sink, stream) = ws.split();
		let (message_tx, message_rx) = mpsc::unbounded_channel();

		Ok((
			Self {
				sender: WebSocketTransportSender { sink },
				receiver: WebSocketTransportReceiver { stream, message_tx },
			},
			message_rx,
		))
	}

	/// Splits the transport into boxed halves for the connection.
	pub fn into_transport_parts(self, message_rx: mpsc::UnboundedReceiver<Value>) -> TransportParts {
		TransportParts {
			sender: Box::new(self.sender),
			receiver: Box::new(self.receiver),
			message_rx,
		}
	}
}

impl Transport for WebSocketTransportSender {
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(async move {
			let text = serde_json::to_string(&message)?;
			self.sink
				.send(WsMessage::Text(text))
				.await
				.map_err(|e| Error::Transport(format!("Failed to send frame: {}", e)))
		})
	}

	fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(async move {
			self.sink
				.close()
				.await
				.map_err(|e| Error::Transport(format!("Failed to close websocket: {}", e)))
		})
	}
}

impl TransportReceiver for WebSocketTransportReceiver {
	fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
		let WebSocketTransportReceiver {
			mut stream,
			message_tx,
		} = *self;

		Box::pin(async move {
			while let Some(frame) = stream.next().await {
				let frame =
					frame.map_err(|e| Error::Transport(format!("Failed to read frame: {}", e)))?;

				let bytes = match frame {
					WsMessage::Text(text) => text.into_bytes(),
					WsMessage::Binary(data) => data,
					WsMessage::Close(_) => {
						tracing::debug!("Wallet closed the websocket");
						break;
					}
					_ => continue,
				};

				match serde_json::from_slice::<Value>(&bytes) {
					Ok(value) => {
						if message_tx.send(value).is_err() {
							// Connection dropped its receiver; nothing left to feed.
							break;
						}
					}
					Err(e) => {
						tracing::warn!("Skipping undecodable wallet frame: {}", e);
					}
				}
			}
			Ok(())
		})
	}
}

#[cfg(test)]
mod tests;
