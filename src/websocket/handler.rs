use std::sync::Arc;
use axum::{
    extract::{State, ws::{Message, WebSocket, WebSocketUpgrade}},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::models::{ReceivedMessage, SendMessage};
use crate::state::AppState;
use crate::sync::Topic;
use super::connection::{Connection, SessionGuard, Subscriptions};
use super::msg_edit_handler::handle_edit_message;
use super::msg_join_handler::handle_join_message;
use super::msg_ping_handler::handle_ping_message;

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    info!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {

    // Generate unique session ID to identify this client
    let session_id = Uuid::new_v4().to_string();
    info!("WebSocket connection established with session_id: {}", session_id);

    let (mut sender, mut receiver) = socket.split();
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<Arc<SendMessage>>();

    // Subscribe before registering, so this client sees its own arrival in the count
    let mut subscriptions = Subscriptions::new(app_state.hub.clone(), outbox.clone());
    subscriptions.follow(Topic::Users);
    let _session = SessionGuard::connect(app_state.engine.clone(), session_id.clone());

    let mut conn = Connection {
        session_id: session_id.clone(),
        engine: app_state.engine.clone(),
        outbox,
        subscriptions,
    };

    // Write everything queued for this client to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = outbox_rx.recv().await {
            let text = match serde_json::to_string(&*message) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize outgoing message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Read client frames and dispatch them
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let msg = match frame {
                Ok(Message::Text(msg)) => msg,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    debug!("WebSocket read error on {}: {}", conn.session_id, e);
                    break;
                }
            };

            let json_msg: ReceivedMessage = match serde_json::from_str(&msg) {
                Ok(json_msg) => json_msg,
                Err(e) => {
                    error!("Failed to parse message on {}: {}", conn.session_id, e);
                    continue;
                }
            };

            match json_msg {
                ReceivedMessage::Edit(edit) => handle_edit_message(edit, &mut conn),
                ReceivedMessage::Join(join_msg) => handle_join_message(join_msg, &mut conn).await,
                ReceivedMessage::Count => {
                    conn.engine.request_count();
                }
                ReceivedMessage::Ping => handle_ping_message(&conn),
            }
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };
    info!("WebSocket connection {} terminated", session_id);
}
