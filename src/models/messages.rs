use serde::{Deserialize, Serialize};
use crate::models::{Edit, JoinReply};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JoinMessage {
    pub doc_id: String,
    pub sender: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsersMessage {
    pub count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PongMessage {
    pub date: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    pub error: String,
}

/// Frames accepted from a client.
#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ReceivedMessage {
    #[serde(rename = "edit")]
    Edit(Edit),
    #[serde(rename = "join")]
    Join(JoinMessage),
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "ping")]
    Ping,
}

/// Frames sent to clients, either directly or through a topic.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum SendMessage {
    #[serde(rename = "update")]
    Update(Edit),
    #[serde(rename = "history")]
    History(JoinReply),
    #[serde(rename = "users")]
    Users(UsersMessage),
    #[serde(rename = "pong")]
    Pong(PongMessage),
    #[serde(rename = "error")]
    Error(ErrorMessage),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_frame_uses_camel_case_fields() {
        let raw = r#"{"type":"edit","docId":"doc1","content":"Hello","sender":"alice"}"#;
        match serde_json::from_str::<ReceivedMessage>(raw).unwrap() {
            ReceivedMessage::Edit(edit) => assert_eq!(edit, Edit::new("doc1", "Hello", "alice")),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn count_frame_has_no_payload() {
        let msg: ReceivedMessage = serde_json::from_str(r#"{"type":"count"}"#).unwrap();
        assert!(matches!(msg, ReceivedMessage::Count));
    }

    #[test]
    fn users_frame_is_tagged() {
        let json = serde_json::to_value(SendMessage::Users(UsersMessage { count: 3 })).unwrap();
        assert_eq!(json, serde_json::json!({"type": "users", "count": 3}));
    }
}
