use async_trait::async_trait;
use thiserror::Error;

use crate::models::Document;

/// Whether a save created a new record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable home of documents.
///
/// Calls may be slow and fail independently; nothing ties two saves
/// together.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a document, `None` when the store has never seen it.
    async fn load(&self, doc_id: &str) -> Result<Option<Document>, StoreError>;

    /// Create the document if it is unknown, update it otherwise.
    async fn save(&self, doc: &Document) -> Result<SaveOutcome, StoreError>;

    /// Stored documents ordered by id, restricted to one owner when given.
    async fn list(&self, owner: Option<&str>) -> Result<Vec<Document>, StoreError>;
}
