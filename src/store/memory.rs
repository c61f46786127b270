//! In-memory document store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{validate_collection, validate_fields, Document, DocumentPath, DocumentStore, Fields};
use crate::error::Result;

/// Documents kept in process memory, keyed by collection path then id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&path.collection)
            .and_then(|docs| docs.get(&path.id))
            .cloned())
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<Document> {
        validate_fields(&fields)?;

        let now = Utc::now();
        let mut collections = self.collections.write().await;
        let docs = collections.entry(path.collection.clone()).or_default();
        let create_time = docs
            .get(&path.id)
            .and_then(|existing| existing.create_time)
            .unwrap_or(now);

        let doc = Document {
            id: path.id.clone(),
            fields,
            create_time: Some(create_time),
            update_time: Some(now),
        };
        docs.insert(path.id.clone(), doc.clone());
        Ok(doc)
    }

    async fn delete(&self, path: &DocumentPath) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(&path.collection) {
            docs.remove(&path.id);
            if docs.is_empty() {
                collections.remove(&path.collection);
            }
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        validate_collection(collection)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }
}
