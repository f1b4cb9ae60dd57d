use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use super::*;

async fn spawn_server<F, Fut>(handler: F) -> (String, tokio::task::JoinHandle<()>)
where
	F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
	Fut: Future<Output = ()> + Send + 'static,
{
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();

	let handle = tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
		handler(ws).await;
	});

	(format!("ws://{}", addr), handle)
}

#[tokio::test]
async fn test_send_writes_json_text_frame() {
	let (url, server) = spawn_server(|mut ws| async move {
		let incoming = ws.next().await.unwrap().unwrap();
		assert_eq!(incoming, Message::Text("{\"ping\":true}".into()));
	})
	.await;

	let (transport, message_rx) = WebSocketTransport::connect(&url).await.unwrap();
	let mut parts = transport.into_transport_parts(message_rx);

	parts.sender.send(json!({ "ping": true })).await.unwrap();
	server.await.unwrap();
}

#[tokio::test]
async fn test_receiver_forwards_messages_in_order() {
	let (url, server) = spawn_server(|mut ws| async move {
		for i in 1..=3 {
			ws.send(Message::Text(json!({"id": i}).to_string()))
				.await
				.unwrap();
		}
		ws.close(None).await.unwrap();
	})
	.await;

	let (transport, message_rx) = WebSocketTransport::connect(&url).await.unwrap();
	let parts = transport.into_transport_parts(message_rx);
	let mut rx = parts.message_rx;

	let result = parts.receiver.run().await;
	assert!(result.is_ok());

	for expected in 1..=3 {
		let received = rx.recv().await.unwrap();
		assert_eq!(received["id"], expected);
	}
	server.await.unwrap();
}

#[tokio::test]
async fn test_receiver_skips_undecodable_frames() {
	let (url, server) = spawn_server(|mut ws| async move {
		ws.send(Message::Text("not json".into())).await.unwrap();
		ws.send(Message::Binary(b"{\"ok\":1}".to_vec()))
			.await
			.unwrap();
		ws.close(None).await.unwrap();
	})
	.await;

	let (transport, message_rx) = WebSocketTransport::connect(&url).await.unwrap();
	let parts = transport.into_transport_parts(message_rx);
	let mut rx = parts.message_rx;

	parts.receiver.run().await.unwrap();

	let received = rx.recv().await.unwrap();
	assert_eq!(received, json!({"ok": 1}));
	assert!(rx.recv().await.is_none());
	server.await.unwrap();
}

#[tokio::test]
async fn test_connect_refused_is_connection_failed() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);

	let err = WebSocketTransport::connect(&format!("ws://{}", addr))
		.await
		.err()
		.expect("connect should fail");
	assert!(matches!(err, Error::ConnectionFailed { .. }), "{:?}", err);
}
