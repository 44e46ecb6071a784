use tracing::debug;
use chrono::Utc;

use crate::models::{PongMessage, SendMessage};
use super::connection::Connection;

/// Handle a ping - send a pong message back.
pub fn handle_ping_message(conn: &Connection) {
    debug!("Ping received on connection {}", conn.session_id);
    conn.reply(SendMessage::Pong(PongMessage { date: Utc::now().to_rfc3339() }));
}
