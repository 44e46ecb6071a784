use tracing::{debug, error};

use crate::models::{Edit, ErrorMessage, SendMessage};
use crate::sync::Topic;
use super::connection::Connection;

/// Handle an edit - queue it and follow the document it targets
pub fn handle_edit_message(edit: Edit, conn: &mut Connection) {
    debug!("Edit received for document {} from {}", edit.doc_id, edit.sender);

    conn.subscriptions.follow(Topic::Document(edit.doc_id.clone()));

    let doc_id = edit.doc_id.clone();
    if let Err(e) = conn.engine.submit_edit(edit) {
        error!("Failed to queue edit for {}: {}", doc_id, e);
        conn.reply(SendMessage::Error(ErrorMessage { error: e.to_string() }));
    }
}
