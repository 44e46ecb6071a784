use tracing::{info, warn};

use crate::models::{ErrorMessage, JoinMessage, SendMessage};
use crate::sync::Topic;
use super::connection::Connection;

/// Handle a join - follow the document and its sender topic, then load it.
///
/// The history reply arrives through the sender topic, so the topic is
/// followed before the join is issued.
pub async fn handle_join_message(join_msg: JoinMessage, conn: &mut Connection) {
    info!("Join received for document {} from {}", join_msg.doc_id, join_msg.sender);

    conn.subscriptions.follow(Topic::Document(join_msg.doc_id.clone()));
    conn.subscriptions.follow(Topic::History(join_msg.sender.clone()));

    if let Err(e) = conn.engine.join(&join_msg.doc_id, &join_msg.sender).await {
        warn!("Join on {} left unanswered: {}", join_msg.doc_id, e);
        conn.reply(SendMessage::Error(ErrorMessage {
            error: format!("Document '{}' is unavailable", join_msg.doc_id),
        }));
    }
}
