use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Title given to documents that the store has never seen.
pub const DEFAULT_TITLE: &str = "Untitled Document";

/// Durable record of a document, as exchanged with the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub doc_id: String,
    pub title: String,
    pub content: String,
    pub owner: Option<String>,
}

impl Document {
    /// A fresh document with empty content and the default title.
    pub fn empty(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            title: DEFAULT_TITLE.to_string(),
            content: String::new(),
            owner: None,
        }
    }
}

/// One edit submitted by a client. The content replaces the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edit {
    pub doc_id: String,
    pub content: String,
    pub sender: String,
}

impl Edit {
    pub fn new(doc_id: impl Into<String>, content: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            content: content.into(),
            sender: sender.into(),
        }
    }
}

/// Reply to a join request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinReply {
    pub doc_id: String,
    pub content: String,
    pub title: String,
}
