//! Pass-through persistence of arbitrary JSON documents.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Receipt for a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredRecord {
    pub document_id: String,
    pub timestamp: DateTime<Utc>,
}

/// A document store the monitor writes into. Implementations decide where
/// documents live; the monitor only needs an id and a timestamp back.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn store(
        &self,
        collection: &str,
        document: serde_json::Value,
    ) -> Result<StoredRecord, StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Collection name must not be empty")]
    EmptyCollectionName,

    #[error("Documents must be JSON objects")]
    NotAnObject,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    id: String,
    document: serde_json::Value,
}

/// Process-local store, used by default and in tests.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    collections: RwLock<HashMap<String, Vec<StoredDocument>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    pub async fn get(&self, collection: &str, document_id: &str) -> Option<serde_json::Value> {
        self.collections
            .read()
            .await
            .get(collection)?
            .iter()
            .find(|d| d.id == document_id)
            .map(|d| d.document.clone())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn store(
        &self,
        collection: &str,
        document: serde_json::Value,
    ) -> Result<StoredRecord, StoreError> {
        let collection = collection.trim();
        if collection.is_empty() {
            return Err(StoreError::EmptyCollectionName);
        }
        if !document.is_object() {
            return Err(StoreError::NotAnObject);
        }

        let record = StoredRecord {
            document_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
        };
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(StoredDocument {
                id: record.document_id.clone(),
                document,
            });
        Ok(record)
    }
}
