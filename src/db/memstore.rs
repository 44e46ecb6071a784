use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::Document;
use super::{DocumentStore, SaveOutcome, StoreError};

/// Process-local store, used when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(docs: impl IntoIterator<Item = Document>) -> Self {
        let docs = docs.into_iter().map(|d| (d.doc_id.clone(), d)).collect();
        Self { docs: RwLock::new(docs) }
    }

    pub async fn get(&self, doc_id: &str) -> Option<Document> {
        self.docs.read().await.get(doc_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, doc_id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.get(doc_id).await)
    }

    async fn save(&self, doc: &Document) -> Result<SaveOutcome, StoreError> {
        let previous = self.docs.write().await.insert(doc.doc_id.clone(), doc.clone());
        Ok(match previous {
            Some(_) => SaveOutcome::Updated,
            None => SaveOutcome::Created,
        })
    }

    async fn list(&self, owner: Option<&str>) -> Result<Vec<Document>, StoreError> {
        let mut docs: Vec<Document> = self
            .docs
            .read()
            .await
            .values()
            .filter(|doc| owner.is_none() || doc.owner.as_deref() == owner)
            .cloned()
            .collect();
        docs.sort_by(|a, b| a.doc_id.cmp(&b.doc_id));
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_reports_create_then_update() {
        let store = MemoryStore::new();
        let mut doc = Document::empty("doc1");
        assert_eq!(store.save(&doc).await.unwrap(), SaveOutcome::Created);

        doc.content = "Hello".into();
        assert_eq!(store.save(&doc).await.unwrap(), SaveOutcome::Updated);
        assert_eq!(store.load("doc1").await.unwrap().unwrap().content, "Hello");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn list_filters_by_owner_in_id_order() {
        let owned = |id: &str, owner: Option<&str>| Document { owner: owner.map(String::from), ..Document::empty(id) };
        let store = MemoryStore::with_documents([
            owned("b", Some("alice")),
            owned("a", Some("alice")),
            owned("c", Some("bob")),
            owned("d", None),
        ]);

        let ids = |docs: Vec<Document>| docs.into_iter().map(|d| d.doc_id).collect::<Vec<_>>();
        assert_eq!(ids(store.list(Some("alice")).await.unwrap()), vec!["a", "b"]);
        assert_eq!(ids(store.list(None).await.unwrap()), vec!["a", "b", "c", "d"]);
        assert!(store.list(Some("carol")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_document_loads_as_none() {
        let store = MemoryStore::new();
        assert!(store.load("missing").await.unwrap().is_none());
    }
}
