//! Document Store Module
//!
//! Collection/document storage behind the [`DocumentStore`] trait.
//!
//! # Backends
//! - [`MemoryStore`]: process-local, for development and tests
//! - [`FirestoreStore`]: Cloud Firestore REST API
//! - [`CachedStore`]: read-through TTL/LRU cache over any backend

mod cached;
mod firestore;
mod memory;
pub mod value;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, Result};

pub use cached::CachedStore;
pub use firestore::{FirestoreStore, LIST_PAGE_SIZE};
pub use memory::MemoryStore;

// == Public Constants ==
/// Maximum document path length in bytes
pub const MAX_PATH_LENGTH: usize = 1500;

/// Maximum serialized document size in bytes
pub const MAX_DOCUMENT_SIZE: usize = 1024 * 1024; // 1 MB

/// Document field map.
pub type Fields = Map<String, Value>;

// == Document Path ==
/// Location of a document: a collection path plus a document id.
///
/// Collections nest under documents, so `users/u1/attempts/a1` is the
/// document `a1` in the collection `users/u1/attempts`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    pub collection: String,
    pub id: String,
}

impl DocumentPath {
    /// Builds a path from a collection path and an id, validating both.
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Result<Self> {
        let path = Self {
            collection: collection.into(),
            id: id.into(),
        };
        validate_collection(&path.collection)?;
        validate_segment(&path.id)?;
        if path.to_string().len() > MAX_PATH_LENGTH {
            return Err(AppError::InvalidRequest(format!(
                "Document path exceeds maximum length of {} bytes",
                MAX_PATH_LENGTH
            )));
        }
        Ok(path)
    }

    /// Parses `collection/.../id`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim_matches('/');
        match raw.rsplit_once('/') {
            Some((collection, id)) => Self::new(collection, id),
            None => Err(AppError::InvalidRequest(format!(
                "'{}' is not a document path",
                raw
            ))),
        }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Checks a collection path: an odd number of valid segments.
pub fn validate_collection(collection: &str) -> Result<()> {
    let segments: Vec<&str> = collection.split('/').collect();
    if segments.len() % 2 == 0 {
        return Err(AppError::InvalidRequest(format!(
            "'{}' is not a collection path",
            collection
        )));
    }
    segments.into_iter().try_for_each(validate_segment)
}

/// Checks a single path segment.
pub fn validate_segment(segment: &str) -> Result<()> {
    let reserved = segment.len() >= 4 && segment.starts_with("__") && segment.ends_with("__");
    if segment.is_empty() || segment == "." || segment == ".." || reserved || segment.contains('/')
    {
        return Err(AppError::InvalidRequest(format!(
            "Invalid path segment '{}'",
            segment
        )));
    }
    Ok(())
}

/// Rejects field maps larger than [`MAX_DOCUMENT_SIZE`] once serialized.
pub fn validate_fields(fields: &Fields) -> Result<()> {
    let size = serde_json::to_vec(fields)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .len();
    if size > MAX_DOCUMENT_SIZE {
        return Err(AppError::InvalidRequest(format!(
            "Document exceeds maximum size of {} bytes",
            MAX_DOCUMENT_SIZE
        )));
    }
    Ok(())
}

// == Document ==
/// A stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Last path segment
    pub id: String,
    /// Field values
    pub fields: Fields,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    /// Reads a string field.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

// == Document Store Trait ==
/// Storage for documents grouped in collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches a document, `None` when it does not exist.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>>;

    /// Creates or fully replaces a document.
    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<Document>;

    /// Deletes a document. Deleting a missing document succeeds.
    async fn delete(&self, path: &DocumentPath) -> Result<()>;

    /// Lists every document directly in a collection, ordered by id.
    async fn list(&self, collection: &str) -> Result<Vec<Document>>;
}
