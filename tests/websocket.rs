//! WebSocket round trip over a real socket

mod common;

use std::time::Duration;

use colabri_editor::routes::create_app;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn send(client: &mut Client, frame: Value) {
    client.send(Message::text(frame.to_string())).await.unwrap();
}

/// Read frames until one of the given type shows up.
async fn next_of_type(client: &mut Client, kind: &str) -> Value {
    tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            let frame = client.next().await.unwrap().unwrap();
            let Ok(text) = frame.to_text() else { continue };
            let value: Value = match serde_json::from_str(text) {
                Ok(value) => value,
                Err(_) => continue,
            };
            if value["type"] == kind {
                return value;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("no '{}' frame received", kind))
}

/// Read user-count frames until the expected count shows up.
async fn wait_for_count(client: &mut Client, count: u64) {
    tokio::time::timeout(Duration::from_secs(3), async {
        while next_of_type(client, "users").await["count"] != count {}
    })
    .await
    .unwrap_or_else(|_| panic!("user count never reached {}", count));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn edits_reach_other_viewers_and_survive_shutdown() {
    let (state, store) = common::test_state();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let url = format!("ws://{}/ws", addr);

    let (mut alice, _) = connect_async(url.as_str()).await.unwrap();
    wait_for_count(&mut alice, 1).await;

    let (mut bob, _) = connect_async(url.as_str()).await.unwrap();
    wait_for_count(&mut bob, 2).await;

    send(&mut bob, json!({"type": "join", "docId": "doc1", "sender": "bob"})).await;
    let history = next_of_type(&mut bob, "history").await;
    assert_eq!(history["content"], "");
    assert_eq!(history["docId"], "doc1");

    send(&mut alice, json!({"type": "edit", "docId": "doc1", "content": "Hello", "sender": "alice"})).await;
    send(&mut alice, json!({"type": "edit", "docId": "doc1", "content": "Hello World", "sender": "alice"})).await;
    assert_eq!(next_of_type(&mut bob, "update").await["content"], "Hello");
    assert_eq!(next_of_type(&mut bob, "update").await["content"], "Hello World");

    send(&mut alice, json!({"type": "ping"})).await;
    assert!(next_of_type(&mut alice, "pong").await["date"].is_string());

    alice.close(None).await.unwrap();
    wait_for_count(&mut bob, 1).await;

    let report = state.engine.shutdown().await.unwrap();
    assert!(report.final_flush.report().unwrap().failed.is_empty());
    assert_eq!(store.get("doc1").await.unwrap().content, "Hello World");
}
