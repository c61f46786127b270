//! Response DTOs
//!
//! Outgoing HTTP bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::store::{Document, DocumentPath, Fields};
use crate::training::Attempt;

/// Body for the placeholder root route (`GET /`)
#[derive(Debug, Clone, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

impl RootResponse {
    pub fn new() -> Self {
        Self {
            message: "Ear Training API".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for RootResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub cache: CacheStats,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(cache: CacheStats) -> Self {
        Self {
            hit_rate: cache.hit_rate(),
            cache,
        }
    }
}

/// A document as returned by the document API
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    pub path: String,
    pub id: String,
    pub fields: Fields,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

impl DocumentResponse {
    pub fn new(path: &DocumentPath, document: Document) -> Self {
        Self {
            path: path.to_string(),
            id: document.id,
            fields: document.fields,
            create_time: document.create_time,
            update_time: document.update_time,
        }
    }
}

/// Body for `DELETE /documents/*path`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub path: String,
}

impl DeleteResponse {
    pub fn new(path: &DocumentPath) -> Self {
        Self {
            message: format!("Document '{}' deleted", path),
            path: path.to_string(),
        }
    }
}

/// Body for `GET /users/:user_id/attempts`
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub user_id: String,
    pub count: usize,
    pub attempts: Vec<Attempt>,
}

impl HistoryResponse {
    pub fn new(user_id: impl Into<String>, attempts: Vec<Attempt>) -> Self {
        Self {
            user_id: user_id.into(),
            count: attempts.len(),
            attempts,
        }
    }
}

/// Error body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
